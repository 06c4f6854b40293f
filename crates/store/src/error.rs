use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A row the operation requires does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}
