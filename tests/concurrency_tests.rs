//! Multi-threaded behavior of the persistent queue: blocking and
//! backpressure, fair distribution across consumers, cancellation, and
//! iterator fail-fast detection.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tempfile::{tempdir, TempDir};

use filequeue::{Error, PersistentQueue};

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
});

struct TestContext {
    _temp_dir: TempDir,
    queue_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        Lazy::force(&TRACING);

        let temp_dir = tempdir().unwrap();
        let queue_path = temp_dir.path().join("queue.dat");

        Self {
            _temp_dir: temp_dir,
            queue_path,
        }
    }
}

#[test]
fn put_blocks_until_a_consumer_polls() {
    let context = TestContext::new();

    // 28-byte file: exactly two usable 4-byte blocks.
    let queue: Arc<PersistentQueue<Vec<u8>>> =
        Arc::new(PersistentQueue::open(&context.queue_path, 4, 28).unwrap());

    assert!(queue.offer(&Vec::new()).unwrap());
    assert!(queue.offer(&Vec::new()).unwrap());
    assert!(!queue.offer(&Vec::new()).unwrap());

    let consumer = {
        let queue = queue.clone();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            queue.poll().unwrap().expect("a record must be enqueued")
        })
    };

    let before = Instant::now();
    queue.put(&Vec::new()).unwrap();

    assert!(
        before.elapsed() >= Duration::from_millis(150),
        "put must not complete before the consumer polls"
    );

    consumer.join().unwrap();
    assert_eq!(queue.size(), 2);
}

#[test]
fn take_blocks_until_a_producer_puts() {
    let context = TestContext::new();
    let queue: Arc<PersistentQueue<i32>> =
        Arc::new(PersistentQueue::open(&context.queue_path, 4, 4096).unwrap());

    let consumer = {
        let queue = queue.clone();

        thread::spawn(move || {
            let before = Instant::now();
            let element = queue.take().unwrap();
            (element, before.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(200));
    queue.put(&99).unwrap();

    let (element, waited) = consumer.join().unwrap();
    assert_eq!(element, 99);
    assert!(waited >= Duration::from_millis(150));
}

#[test]
fn consumers_share_the_stream_in_order() {
    const QUEUE_ITEMS: i32 = 1024;
    const THREADS: usize = 10;

    let context = TestContext::new();
    let queue: Arc<PersistentQueue<i32>> =
        Arc::new(PersistentQueue::open(&context.queue_path, 9, 4104).unwrap());

    let mut consumers = Vec::new();

    for _ in 0..THREADS {
        let queue = queue.clone();

        consumers.push(thread::spawn(move || {
            let mut seen = Vec::new();

            while let Some(element) = queue.poll_timeout(Duration::from_secs(2)).unwrap() {
                thread::yield_now();
                seen.push(element);
            }

            seen
        }));
    }

    for i in 0..QUEUE_ITEMS {
        queue.put(&i).unwrap();
    }

    let mut all = Vec::new();

    for consumer in consumers {
        let seen = consumer.join().unwrap();

        // Each consumer's subsequence respects the global FIFO order.
        assert!(
            seen.windows(2).all(|pair| pair[0] < pair[1]),
            "a consumer observed values out of order"
        );

        all.extend(seen);
    }

    all.sort_unstable();
    assert_eq!(all, (0..QUEUE_ITEMS).collect::<Vec<_>>());
}

#[test]
fn competing_producers_and_consumers_lose_nothing() {
    const PER_PRODUCER: i32 = 200;
    const PRODUCERS: i32 = 4;

    let context = TestContext::new();

    // Small ring so producers regularly block on free blocks.
    let queue: Arc<PersistentQueue<i32>> =
        Arc::new(PersistentQueue::open(&context.queue_path, 4, 256).unwrap());

    let mut producers = Vec::new();

    for p in 0..PRODUCERS {
        let queue = queue.clone();

        producers.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                queue.put(&(p * PER_PRODUCER + i)).unwrap();
            }
        }));
    }

    let consumer = {
        let queue = queue.clone();

        thread::spawn(move || {
            let mut seen = Vec::new();

            while seen.len() < (PRODUCERS * PER_PRODUCER) as usize {
                if let Some(element) = queue.poll_timeout(Duration::from_secs(2)).unwrap() {
                    seen.push(element);
                }
            }

            seen
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }

    let mut seen = consumer.join().unwrap();
    seen.sort_unstable();

    assert_eq!(seen, (0..PRODUCERS * PER_PRODUCER).collect::<Vec<_>>());
    assert!(queue.is_empty());
}

#[test]
fn iterator_fails_fast_on_mutation() {
    let context = TestContext::new();
    let queue: PersistentQueue<i32> =
        PersistentQueue::open(&context.queue_path, 4, 4096).unwrap();

    for i in 0..20 {
        queue.put(&i).unwrap();
    }

    let mut iter = queue.iter();

    assert_eq!(iter.next().unwrap().unwrap(), 0);
    assert_eq!(iter.next().unwrap().unwrap(), 1);

    queue.put(&20).unwrap();

    assert!(matches!(
        iter.next(),
        Some(Err(Error::ConcurrentModification))
    ));
}

#[test]
fn iterator_fails_fast_on_dequeue() {
    let context = TestContext::new();
    let queue: PersistentQueue<i32> =
        PersistentQueue::open(&context.queue_path, 4, 4096).unwrap();

    for i in 0..5 {
        queue.put(&i).unwrap();
    }

    let mut iter = queue.iter();
    assert_eq!(iter.next().unwrap().unwrap(), 0);

    assert_eq!(queue.poll().unwrap(), Some(0));

    assert!(matches!(
        iter.next(),
        Some(Err(Error::ConcurrentModification))
    ));
}

#[test]
fn close_interrupts_blocked_waiters() {
    let context = TestContext::new();
    let queue: Arc<PersistentQueue<i32>> =
        Arc::new(PersistentQueue::open(&context.queue_path, 4, 4096).unwrap());

    let blocked_taker = {
        let queue = queue.clone();
        thread::spawn(move || queue.take())
    };

    thread::sleep(Duration::from_millis(100));
    queue.close();

    assert!(matches!(
        blocked_taker.join().unwrap(),
        Err(Error::Interrupted)
    ));
    assert!(matches!(queue.poll(), Err(Error::State(_))));
}

#[test]
fn timed_poll_gives_up_on_an_empty_queue() {
    let context = TestContext::new();
    let queue: PersistentQueue<i32> =
        PersistentQueue::open(&context.queue_path, 4, 4096).unwrap();

    let before = Instant::now();

    assert_eq!(
        queue.poll_timeout(Duration::from_millis(100)).unwrap(),
        None
    );
    assert!(before.elapsed() >= Duration::from_millis(100));
}

#[test]
fn timed_offer_gives_up_on_a_full_queue() {
    let context = TestContext::new();
    let queue: PersistentQueue<Vec<u8>> =
        PersistentQueue::open(&context.queue_path, 4, 24).unwrap();

    assert!(queue.offer(&Vec::new()).unwrap());

    let before = Instant::now();

    assert!(!queue
        .offer_timeout(&Vec::new(), Duration::from_millis(100))
        .unwrap());
    assert!(before.elapsed() >= Duration::from_millis(100));
}
