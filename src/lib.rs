//! filequeue - a bounded blocking FIFO queue persisted in a
//! memory-mapped file, with the concurrency primitives it is built on.
//!
//! # Overview
//!
//! The centerpiece is [`PersistentQueue`], a multi-producer
//! multi-consumer blocking queue whose contents live in a fixed-size
//! file managed in allocation blocks:
//!
//! 1. Producers serialize an element, reserve blocks from a fair
//!    counting semaphore, append a length-prefixed record at the tail
//!    under a write lock, and release one record slot.
//! 2. Consumers claim a slot, advance the head cursor under the write
//!    lock, deserialize under the read lock, and hand the record's
//!    blocks back to producers.
//!
//! The file header persists the cursors on every mutation, so a queue
//! reopened after a process restart resumes exactly where it left off.
//! Flushing is left to the operating system's page cache; the queue is
//! restart-durable, not power-loss-durable.
//!
//! # Key features
//!
//! - Memory-mapped I/O with a block-managed ring area and wrap-around
//!   records
//! - Fair producer/consumer backpressure with blocking, timed, and
//!   non-blocking variants of every operation
//! - Fail-fast, snapshot-coupled iteration
//! - A pluggable, self-describing payload encoding ([`Element`])
//! - Supporting primitives usable on their own: a fair counting
//!   semaphore, a lock-free sample ring, and a one-shot initialization
//!   barrier ([`sync`]), plus latency/throughput monitors built on them
//!   ([`monitor`])
//!
//! # Usage
//!
//! ```
//! use filequeue::PersistentQueue;
//!
//! # fn main() -> filequeue::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let queue = PersistentQueue::open(dir.path().join("work.q"), 64, 64 * 1024)?;
//!
//! queue.put(&"first".to_string())?;
//! queue.put(&"second".to_string())?;
//!
//! assert_eq!(queue.take()?, "first");
//! assert_eq!(queue.poll()?, Some("second".to_string()));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod error;
pub mod monitor;
pub mod queue;
pub mod sync;
pub mod wire;

pub use error::{Error, Result};
pub use queue::{Iter, PersistentQueue};
pub use wire::Element;
