//! Concurrency primitives underpinning the persistent queue.
//!
//! Three standalone building blocks live here:
//!
//! - [`Semaphore`], a FIFO-fair counting semaphore; the queue runs two
//!   of them, one counting free blocks and one counting enqueued
//!   records.
//! - [`SampleBuffer`], a lock-free circular sample ring with a
//!   stable-snapshot protocol, used by the monitoring layer.
//! - [`Initializer`], a one-shot initialization barrier for lazy
//!   construction of shared services.

mod init;
mod sample;
mod semaphore;

pub use init::{InitToken, Initializer};
pub use sample::SampleBuffer;
pub use semaphore::{Interrupted, Semaphore};
