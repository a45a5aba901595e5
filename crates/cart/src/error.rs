//! Cart storage error types.

use thiserror::Error;

/// Errors that can occur while reading or writing the durable cart slot.
///
/// These never reach the UI: the store recovers locally and keeps serving
/// the in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure (missing directory, permissions, disk full).
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Cart payload could not be serialized.
    #[error("cart serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
