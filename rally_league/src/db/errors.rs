//! Store error types.

use std::time::Duration;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation timed out
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored value outside the domain, e.g. an unknown status string
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Backend refused or failed the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
