//! Error types for key-value store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A write would push the persisted payload past the configured quota.
    #[error("storage quota exceeded: {used} bytes needed, limit is {limit}")]
    QuotaExceeded {
        /// Bytes the payload would occupy after the write.
        used: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Failed to serialize or deserialize a stored value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O against the backing medium failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing medium cannot be used.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
