//! Error types shared across the crate.

use std::io;

use crate::wire::WireError;

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for queue operations.
///
/// Construction failures (`InvalidArgument`, `State`, `Io`) are fatal to
/// the queue instance. `Codec` failures are fatal to the in-progress
/// operation only, though the on-disk bytes behind a failed decode are
/// corrupt and further behavior of that region is undefined.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed construction parameters or method arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The queue is in a state in which the operation cannot proceed:
    /// the file header disagrees with the open parameters, the file is
    /// corrupt, or the queue has been closed.
    #[error("illegal state: {0}")]
    State(String),

    /// A payload failed to encode or decode.
    #[error("illegal state: payload codec failure")]
    Codec(#[source] WireError),

    /// The operation is not supported by a storage-bound queue.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// `element` or `remove` was called on an empty queue.
    #[error("the queue is currently empty")]
    Empty,

    /// The queue was modified while an iterator was active.
    #[error("the queue has been modified during iteration")]
    ConcurrentModification,

    /// A blocking or timed wait was cancelled because the queue closed.
    #[error("interrupted while waiting")]
    Interrupted,

    /// An underlying file or mapping operation failed.
    #[error("i/o error")]
    Io(#[from] io::Error),

    /// `add` was called when `offer` would have returned `false`.
    #[error("insufficient blocks available for element")]
    CapacityExhausted,
}

impl From<WireError> for Error {
    fn from(error: WireError) -> Self {
        Error::Codec(error)
    }
}
