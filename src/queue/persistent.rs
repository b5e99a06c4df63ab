//! The persistent queue implementation.

use std::fs::OpenOptions;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

use memmap2::{MmapMut, MmapOptions};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::queue::view::{ReadView, WriteView};
use crate::queue::{Geometry, Header, Iter, HEADER_LEN, INT_SIZE};
use crate::sync::Semaphore;
use crate::wire::Element;

/// Cursor state and the mapping it indexes, guarded by the header lock.
pub(super) struct Inner {
    pub map: MmapMut,
    pub head: i32,
    pub tail: i32,
}

/// A bounded blocking FIFO queue backed by a memory-mapped file.
///
/// Elements are serialized through the [`Element`] encoding and stored
/// as length-prefixed records in a block-managed ring area of the file.
/// Capacity is *storage bound*: there is no maximum element count, only
/// a maximum amount of serialized data. Producers block (or fail, for
/// the non-blocking variants) when the ring has too few free blocks;
/// consumers block while the queue is empty.
///
/// The mapped file is flushed at the operating system's convenience,
/// plus on [`flush`](Self::flush) and [`close`](Self::close). A queue
/// file survives process restarts, but without any write barrier it is
/// not proof against sudden power loss and offers no ACID guarantees.
///
/// All operations take `&self`; share the queue between producer and
/// consumer threads with an [`Arc`](std::sync::Arc).
pub struct PersistentQueue<E> {
    pub(super) geometry: Geometry,
    pub(super) inner: RwLock<Inner>,
    count: AtomicI32,
    closed: AtomicBool,
    /// Free blocks in the ring area.
    blocks: Semaphore,
    /// Enqueued records.
    slots: Semaphore,
    path: PathBuf,
    _element: PhantomData<fn() -> E>,
}

impl<E: Element> PersistentQueue<E> {
    /// Map `path` to a persistent queue.
    ///
    /// A missing or empty file is initialized to `file_size` bytes with
    /// an empty ring. An existing file must carry a header whose
    /// `file_size` and `block_size` match the parameters exactly; its
    /// persisted records become immediately available for consumption.
    ///
    /// `block_size` must be at least 4 and divide `file_size`, and the
    /// file must have room for at least one block beyond the header.
    pub fn open(path: impl AsRef<Path>, block_size: i32, file_size: i32) -> Result<Self> {
        let geometry = Geometry::new(block_size, file_size)?;
        let path = path.as_ref().to_path_buf();

        let existing = path.exists() && std::fs::metadata(&path)?.len() > 0;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        if file.metadata()?.len() < file_size as u64 {
            file.set_len(file_size as u64)?;
        }

        let mut map = unsafe { MmapOptions::new().len(file_size as usize).map_mut(&file)? };

        let (count, head, tail) = if existing {
            let header = Header::read(&map[..HEADER_LEN]);

            if header.file_size != file_size {
                return Err(Error::State(format!(
                    "existing file was sized {}, not {file_size}",
                    header.file_size
                )));
            }

            if header.block_size != block_size {
                return Err(Error::State(format!(
                    "existing file uses block size {}, not {block_size}",
                    header.block_size
                )));
            }

            validate_cursors(&geometry, &header)?;

            (header.count, header.head, header.tail)
        } else {
            let header = Header {
                file_size,
                block_size,
                count: 0,
                head: geometry.first_usable_block,
                tail: geometry.first_usable_block,
            };

            // Write the header in case no elements ever come.
            header.write(&mut map[..HEADER_LEN]);

            (0, header.head, header.tail)
        };

        let occupied = occupied_blocks(&geometry, count, head, tail);

        debug!(
            path = %path.display(),
            file_size,
            block_size,
            count,
            "opened queue file"
        );

        Ok(Self {
            geometry,
            inner: RwLock::new(Inner { map, head, tail }),
            count: AtomicI32::new(count),
            closed: AtomicBool::new(false),
            blocks: Semaphore::new((geometry.usable_blocks() - occupied) as usize),
            slots: Semaphore::new(count as usize),
            path,
            _element: PhantomData,
        })
    }

    /// The file this queue is mapped to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enqueue an element without blocking.
    ///
    /// Returns `false` if the ring has too few free blocks for the
    /// serialized element. Never partially enqueues.
    pub fn offer(&self, element: &E) -> Result<bool> {
        self.ensure_open()?;

        let payload = encode(element);

        if !self.blocks.try_acquire(self.required_blocks(payload.len())) {
            return Ok(false);
        }

        self.append_tail(&payload);
        Ok(true)
    }

    /// Enqueue an element, waiting up to `timeout` for free blocks.
    ///
    /// Returns `false` on timeout.
    pub fn offer_timeout(&self, element: &E, timeout: Duration) -> Result<bool> {
        self.ensure_open()?;

        let payload = encode(element);

        if !self
            .blocks
            .acquire_timeout(self.required_blocks(payload.len()), timeout)
            .map_err(|_| Error::Interrupted)?
        {
            return Ok(false);
        }

        self.append_tail(&payload);
        Ok(true)
    }

    /// Enqueue an element, blocking until enough blocks are free.
    ///
    /// Fails with [`Error::Interrupted`] if the queue is closed while
    /// waiting.
    pub fn put(&self, element: &E) -> Result<()> {
        self.ensure_open()?;

        let payload = encode(element);

        self.blocks
            .acquire(self.required_blocks(payload.len()))
            .map_err(|_| Error::Interrupted)?;

        self.append_tail(&payload);
        Ok(())
    }

    /// Enqueue an element, failing with [`Error::CapacityExhausted`]
    /// when [`offer`](Self::offer) would return `false`.
    pub fn add(&self, element: &E) -> Result<()> {
        if self.offer(element)? {
            Ok(())
        } else {
            Err(Error::CapacityExhausted)
        }
    }

    /// Dequeue the head element without blocking, or `None` if the
    /// queue is empty.
    pub fn poll(&self) -> Result<Option<E>> {
        self.ensure_open()?;

        if self.slots.try_acquire(1) {
            self.remove_head().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Dequeue the head element, waiting up to `timeout` for one to be
    /// enqueued. Returns `None` on timeout.
    pub fn poll_timeout(&self, timeout: Duration) -> Result<Option<E>> {
        self.ensure_open()?;

        if self
            .slots
            .acquire_timeout(1, timeout)
            .map_err(|_| Error::Interrupted)?
        {
            self.remove_head().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Dequeue the head element, blocking until one is available.
    ///
    /// Fails with [`Error::Interrupted`] if the queue is closed while
    /// waiting.
    pub fn take(&self) -> Result<E> {
        self.ensure_open()?;

        self.slots.acquire(1).map_err(|_| Error::Interrupted)?;
        self.remove_head()
    }

    /// Return a copy of the head element without consuming it, or
    /// `None` if the queue is empty.
    ///
    /// Each call deserializes afresh: two consecutive peeks on an idle
    /// queue return equal but distinct values.
    pub fn peek(&self) -> Result<Option<E>> {
        self.ensure_open()?;

        // No slot permits means the queue is empty, or will be as soon
        // as the consumers holding the permits finish. Reject before
        // paying for the lock.
        if self.slots.available() == 0 {
            return Ok(None);
        }

        let inner = self.inner.read();

        // A consumer may have claimed the last record between the
        // permit check and the lock; the count is authoritative here.
        if self.count.load(Ordering::Relaxed) == 0 {
            return Ok(None);
        }

        let mut view = ReadView::new(&inner.map[..], self.geometry.first_usable_block as usize);
        view.set_position(inner.head as usize);

        let size = view.get_i32();
        self.validate_record_len(size)?;

        let payload = view.read_wrapping(size as usize);

        E::decode(&payload).map(Some).map_err(Error::from)
    }

    /// As [`peek`](Self::peek), but fails with [`Error::Empty`] when
    /// the queue is empty.
    pub fn element(&self) -> Result<E> {
        self.peek()?.ok_or(Error::Empty)
    }

    /// As [`poll`](Self::poll), but fails with [`Error::Empty`] when
    /// the queue is empty.
    pub fn remove(&self) -> Result<E> {
        self.poll()?.ok_or(Error::Empty)
    }

    /// The number of currently enqueued records.
    ///
    /// Read from the consumer semaphore without the header lock, so the
    /// value is approximate while producers or consumers are active.
    pub fn size(&self) -> usize {
        self.slots.available()
    }

    /// Whether the queue is empty, read without synchronization.
    pub fn is_empty(&self) -> bool {
        self.count.load(Ordering::Relaxed) == 0
    }

    /// Empty the queue and hand every usable block back to producers.
    ///
    /// Must be externally synchronized with concurrent producers and
    /// consumers; racing them leaves the permit accounting undefined.
    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;

        // Stop allocation to the queue before resetting the cursors.
        self.blocks.drain();
        self.slots.drain();

        let mut inner = self.inner.write();

        self.count.store(0, Ordering::Relaxed);
        inner.head = self.geometry.first_usable_block;
        inner.tail = self.geometry.first_usable_block;

        self.store_header(&mut inner);

        self.blocks.release(self.geometry.usable_blocks() as usize);

        debug!(path = %self.path.display(), "cleared queue");
        Ok(())
    }

    /// Dequeue every enqueued element into `sink`, in FIFO order.
    ///
    /// Returns the number of elements drained.
    pub fn drain_to(&self, sink: &mut Vec<E>) -> Result<usize> {
        self.drain_to_limit(sink, usize::MAX)
    }

    /// Dequeue up to `max` elements into `sink`, in FIFO order, as one
    /// atomic bulk operation under the write lock.
    ///
    /// Returns the number of elements drained.
    pub fn drain_to_limit(&self, sink: &mut Vec<E>, max: usize) -> Result<usize> {
        self.ensure_open()?;

        let permits = self.slots.drain();
        let taking = permits.min(max);

        let mut inner = self.inner.write();

        if taking < permits {
            self.slots.release(permits - taking);
        }

        for drained in 0..taking {
            let (at, size) = match self.advance_head(&mut inner) {
                Ok(record) => record,
                Err(error) => {
                    // The head record was not consumed; its permit and
                    // the rest go back.
                    self.slots.release(taking - drained);
                    return Err(error);
                }
            };

            self.store_header(&mut inner);

            let element = self.read_payload(&inner, at, size);
            self.blocks
                .release(self.required_blocks(size as usize));

            match element {
                Ok(element) => sink.push(element),
                Err(error) => {
                    // The corrupt record is consumed; only the
                    // remaining permits go back.
                    self.slots.release(taking - drained - 1);
                    return Err(error);
                }
            }
        }

        Ok(taking)
    }

    /// Iterate the enqueued records oldest-to-newest without consuming
    /// them.
    ///
    /// The iterator snapshots the cursors at construction and fails
    /// fast with [`Error::ConcurrentModification`] if the queue is
    /// mutated while it is active.
    pub fn iter(&self) -> Iter<'_, E> {
        let inner = self.inner.read();
        let empty = self.count.load(Ordering::Relaxed) == 0;

        Iter::new(self, inner.head, inner.tail, empty)
    }

    /// Ask the operating system to flush dirty pages of the mapping.
    ///
    /// Best effort only: mapping errors are swallowed, and no
    /// durability barrier is promised.
    pub fn flush(&self) -> Result<()> {
        self.ensure_open()?;

        let inner = self.inner.read();

        if let Err(error) = inner.map.flush() {
            debug!(path = %self.path.display(), %error, "best-effort flush failed");
        }

        Ok(())
    }

    /// The remaining element capacity.
    ///
    /// This queue is byte-bounded, not element-bounded, so this is
    /// always the maximum positive integer.
    pub fn remaining_capacity(&self) -> usize {
        usize::MAX
    }

    /// Always `false`: records are not deserialized until requested, so
    /// membership is never inspected.
    pub fn contains(&self, _element: &E) -> bool {
        false
    }

    /// Unsupported: removal by identity requires deserializing and
    /// compacting the ring.
    pub fn remove_item(&self, _element: &E) -> Result<bool> {
        Err(Error::Unsupported("remove_item"))
    }

    /// Unsupported; see [`remove_item`](Self::remove_item).
    pub fn remove_all(&self, _elements: &[E]) -> Result<bool> {
        Err(Error::Unsupported("remove_all"))
    }

    /// Unsupported; see [`remove_item`](Self::remove_item).
    pub fn retain_all(&self, _elements: &[E]) -> Result<bool> {
        Err(Error::Unsupported("retain_all"))
    }

    /// Unsupported: membership is never inspected.
    pub fn contains_all(&self, _elements: &[E]) -> Result<bool> {
        Err(Error::Unsupported("contains_all"))
    }

    /// Unsupported: materializing the queue would consume it.
    pub fn to_vec(&self) -> Result<Vec<E>> {
        Err(Error::Unsupported("to_vec"))
    }

    /// Close the queue: interrupt every blocked producer and consumer,
    /// flush the mapping, and fail all subsequent operations.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.blocks.interrupt_all();
        self.slots.interrupt_all();

        let inner = self.inner.read();
        let _ = inner.map.flush();

        debug!(path = %self.path.display(), "closed queue");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(Error::State("the queue is closed".to_string()))
        } else {
            Ok(())
        }
    }

    /// Blocks consumed by a record with a payload of `payload_len`
    /// bytes, including its length prefix.
    fn required_blocks(&self, payload_len: usize) -> usize {
        let bytes = payload_len as u64 + INT_SIZE as u64;
        let block = self.geometry.block_size as u64;

        bytes.div_ceil(block) as usize
    }

    pub(super) fn validate_record_len(&self, size: i32) -> Result<()> {
        if size < 0 || i64::from(size) + i64::from(INT_SIZE) > i64::from(self.geometry.usable_bytes())
        {
            Err(Error::State(format!(
                "record length {size} at head cursor is corrupt"
            )))
        } else {
            Ok(())
        }
    }

    /// Append a serialized payload at the tail. The caller has already
    /// acquired the block permits the record requires.
    fn append_tail(&self, payload: &[u8]) {
        let mut inner = self.inner.write();

        {
            let Inner { map, tail, .. } = &mut *inner;
            let mut view =
                WriteView::new(&mut map[..], self.geometry.first_usable_block as usize);

            view.set_position(*tail as usize);

            // The previous write may have parked the tail at the file
            // end; the ring restarts at the mark.
            if view.remaining() == 0 {
                view.reset_to_mark();
            }

            view.put_i32(payload.len() as i32);
            view.put_wrapping(payload);

            *tail = self.geometry.normalize(view.position() as i32);
        }

        self.count.fetch_add(1, Ordering::Relaxed);
        self.slots.release(1);

        self.store_header(&mut inner);
    }

    /// Consume the record at the head cursor: read its length, advance
    /// the cursor with the ring's wrap rule, and decrement the count.
    /// Returns the record's position and payload length. Fails without
    /// consuming anything if the stored length is corrupt.
    fn advance_head(&self, inner: &mut Inner) -> Result<(i32, i32)> {
        let Inner { map, head, .. } = &mut *inner;
        let mut view = ReadView::new(&map[..], self.geometry.first_usable_block as usize);

        view.set_position(*head as usize);

        let size = view.get_i32();
        self.validate_record_len(size)?;

        let mut next = self.geometry.normalize(view.position() as i32 + size);

        if next >= self.geometry.file_size {
            next = next - self.geometry.file_size + self.geometry.first_usable_block;
        }

        let at = *head;
        *head = next;
        self.count.fetch_sub(1, Ordering::Relaxed);

        Ok((at, size))
    }

    /// Deserialize the record at `at`. Requires at least a read lock on
    /// `inner`; the caller still holds the record's block permits, so
    /// the bytes cannot be overwritten underneath the decode.
    fn read_payload(&self, inner: &Inner, at: i32, size: i32) -> Result<E> {
        let mut view = ReadView::new(&inner.map[..], self.geometry.first_usable_block as usize);

        view.set_position(at as usize);
        view.get_i32();

        let payload = view.read_wrapping(size as usize);

        E::decode(&payload).map_err(Error::from)
    }

    /// Remove and return the head record. The caller has already
    /// acquired one slot permit.
    fn remove_head(&self) -> Result<E> {
        let mut inner = self.inner.write();

        let (at, size) = match self.advance_head(&mut inner) {
            Ok(record) => record,
            Err(error) => {
                drop(inner);
                // Nothing was consumed; the permit goes back.
                self.slots.release(1);
                return Err(error);
            }
        };

        self.store_header(&mut inner);

        // Demote to a read lock: deserialization must not hold up other
        // readers, and the block permits still held for this record
        // keep producers away from its bytes.
        let inner = RwLockWriteGuard::downgrade(inner);
        let element = self.read_payload(&inner, at, size);
        drop(inner);

        self.blocks.release(self.required_blocks(size as usize));

        element
    }

    /// Rewrite the 20-byte header at offset zero. Call with the write
    /// lock held, after every cursor or count mutation.
    fn store_header(&self, inner: &mut Inner) {
        let header = Header {
            file_size: self.geometry.file_size,
            block_size: self.geometry.block_size,
            count: self.count.load(Ordering::Relaxed),
            head: inner.head,
            tail: inner.tail,
        };

        header.write(&mut inner.map[..HEADER_LEN]);
    }
}

impl<E> Drop for PersistentQueue<E> {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let inner = self.inner.read();
            let _ = inner.map.flush();
        }
    }
}

impl<'a, E: Element> IntoIterator for &'a PersistentQueue<E> {
    type Item = Result<E>;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Blocks occupied by live records, derived from the persisted cursors.
fn occupied_blocks(geometry: &Geometry, count: i32, head: i32, tail: i32) -> i32 {
    let ring = geometry.file_size - geometry.first_usable_block;

    // A tail parked exactly at the file end is equivalent to one at the
    // ring start.
    let tail = if tail == geometry.file_size {
        geometry.first_usable_block
    } else {
        tail
    };

    let bytes = if count == 0 {
        0
    } else if tail > head {
        tail - head
    } else if tail < head {
        ring - (head - tail)
    } else {
        ring
    };

    bytes / geometry.block_size
}

fn validate_cursors(geometry: &Geometry, header: &Header) -> Result<()> {
    let aligned = |at: i32| at % geometry.block_size == 0;
    let in_ring = |at: i32| at >= geometry.first_usable_block && at <= geometry.file_size;

    let plausible = header.count >= 0
        && header.count <= geometry.usable_blocks()
        && aligned(header.head)
        && aligned(header.tail)
        && in_ring(header.head)
        && header.head < geometry.file_size
        && in_ring(header.tail);

    if plausible {
        Ok(())
    } else {
        Err(Error::State(format!(
            "existing file header is corrupt: count {}, head {}, tail {}",
            header.count, header.head, header.tail
        )))
    }
}

fn encode<E: Element>(element: &E) -> Vec<u8> {
    let mut payload = Vec::new();
    element.encode(&mut payload);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn queue_at(dir: &tempfile::TempDir, block_size: i32, file_size: i32) -> PersistentQueue<i32> {
        PersistentQueue::open(dir.path().join("queue.dat"), block_size, file_size).unwrap()
    }

    #[test]
    fn construction_validates_geometry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.dat");

        assert!(matches!(
            PersistentQueue::<i32>::open(&path, 3, 300),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            PersistentQueue::<i32>::open(&path, 8, 100),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            PersistentQueue::<i32>::open(&path, 8, 4),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            PersistentQueue::<i32>::open(&path, 20, 20),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn reopen_validates_parameters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queue.dat");

        let queue: PersistentQueue<i32> = PersistentQueue::open(&path, 4, 4096).unwrap();
        queue.flush().unwrap();
        drop(queue);

        assert!(matches!(
            PersistentQueue::<i32>::open(&path, 8, 4096),
            Err(Error::State(_))
        ));
        assert!(matches!(
            PersistentQueue::<i32>::open(&path, 4, 8192),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn empty_queue_observers() {
        let dir = tempdir().unwrap();
        let queue = queue_at(&dir, 4, 4096);

        assert!(queue.is_empty());
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.peek().unwrap(), None);
        assert_eq!(queue.poll().unwrap(), None);
        assert!(matches!(queue.element(), Err(Error::Empty)));
        assert!(matches!(queue.remove(), Err(Error::Empty)));
    }

    #[test]
    fn peek_is_idempotent() {
        let dir = tempdir().unwrap();
        let queue = queue_at(&dir, 4, 4096);

        queue.put(&41).unwrap();
        queue.put(&42).unwrap();

        for _ in 0..20 {
            assert_eq!(queue.peek().unwrap(), Some(41));
        }

        assert_eq!(queue.size(), 2);
    }

    #[test]
    fn add_fails_when_offer_would() {
        let dir = tempdir().unwrap();
        // 24-byte file: one usable 4-byte block past the header.
        let queue: PersistentQueue<Vec<u8>> =
            PersistentQueue::open(dir.path().join("queue.dat"), 4, 24).unwrap();

        queue.add(&Vec::new()).unwrap();
        assert!(!queue.offer(&Vec::new()).unwrap());
        assert!(matches!(
            queue.add(&Vec::new()),
            Err(Error::CapacityExhausted)
        ));
    }

    #[test]
    fn clear_restores_capacity() {
        let dir = tempdir().unwrap();
        let queue = queue_at(&dir, 4, 4096);

        for i in 0..50 {
            queue.put(&i).unwrap();
        }

        queue.clear().unwrap();

        assert!(queue.is_empty());
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.poll().unwrap(), None);

        for i in 0..50 {
            queue.put(&i).unwrap();
        }

        assert_eq!(queue.size(), 50);
    }

    #[test]
    fn drain_collects_in_order() {
        let dir = tempdir().unwrap();
        let queue = queue_at(&dir, 4, 4096);

        for i in 0..10 {
            queue.put(&i).unwrap();
        }

        let mut sink = Vec::new();
        assert_eq!(queue.drain_to_limit(&mut sink, 4).unwrap(), 4);
        assert_eq!(sink, vec![0, 1, 2, 3]);
        assert_eq!(queue.size(), 6);

        assert_eq!(queue.drain_to(&mut sink).unwrap(), 6);
        assert_eq!(sink, (0..10).collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn unsupported_surface() {
        let dir = tempdir().unwrap();
        let queue = queue_at(&dir, 4, 4096);

        queue.put(&7).unwrap();

        assert!(!queue.contains(&7));
        assert!(matches!(queue.remove_item(&7), Err(Error::Unsupported(_))));
        assert!(matches!(queue.remove_all(&[7]), Err(Error::Unsupported(_))));
        assert!(matches!(queue.retain_all(&[7]), Err(Error::Unsupported(_))));
        assert!(matches!(
            queue.contains_all(&[7]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(queue.to_vec(), Err(Error::Unsupported(_))));
        assert_eq!(queue.remaining_capacity(), usize::MAX);
    }

    #[test]
    fn closed_queue_rejects_operations() {
        let dir = tempdir().unwrap();
        let queue = queue_at(&dir, 4, 4096);

        queue.put(&1).unwrap();
        queue.close();

        assert!(matches!(queue.put(&2), Err(Error::State(_))));
        assert!(matches!(queue.poll(), Err(Error::State(_))));
        assert!(matches!(queue.peek(), Err(Error::State(_))));
        assert!(matches!(queue.clear(), Err(Error::State(_))));
        assert!(matches!(queue.flush(), Err(Error::State(_))));
    }
}
