//! Cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when using a cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Only GET requests can be stored.
    #[error("unsupported method for cache storage: {0}")]
    UnsupportedMethod(String),

    /// Store name cannot be used as a storage location.
    #[error("invalid cache name: {0}")]
    InvalidName(String),

    /// The store was deleted while a handle to it was still in use.
    #[error("cache store was deleted: {0}")]
    StoreDeleted(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Failed to serialize or deserialize a stored entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
