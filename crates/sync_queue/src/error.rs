//! Error types for the sync queue crate.

use thiserror::Error;

/// Result type alias for sync queue operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while operating the mutation queue.
///
/// Remote failures are not represented here: they are routed per record by the
/// sync engine (retry, conflict resolution, or discard) and never abort a run.
/// `SyncError` covers the failures the engine itself cannot absorb.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The durable queue store could not be read or written.
    #[error("queue store error: {0}")]
    Store(#[from] QueueError),
}

/// Errors raised by the persistent queue store.
#[derive(Error, Debug)]
pub enum QueueError {
    /// I/O error while reading or writing the backing file.
    #[error("I/O error: {0}")]
    Io(String),

    /// The backing file could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for QueueError {
    fn from(err: std::io::Error) -> Self {
        QueueError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Serialization(err.to_string())
    }
}
