//! Storage errors.

use std::time::Duration;

use thiserror::Error;

/// Storage error types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The exclusive lock could not be acquired in time.
    #[error("Timed out after {timeout:?} waiting for lock '{resource}'")]
    LockTimeout { resource: String, timeout: Duration },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
