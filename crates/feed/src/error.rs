//! Error types for durable client storage.

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::traits::KeyValueStore).
///
/// Callers in this crate treat all of them as "storage unavailable" and carry
/// on; they exist so store implementations can still report what went wrong.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage disabled, quota exceeded, ...
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
