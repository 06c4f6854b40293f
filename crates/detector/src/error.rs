use thiserror::Error;
use uuid::Uuid;
use vigil_store::StoreError;

/// Result type for detection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The detection parameters are malformed.
    #[error("invalid detection options: {0}")]
    InvalidOptions(String),

    /// Errors passed through from the underlying stores.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No service with the given id is registered.
    #[error("unknown service: {0}")]
    UnknownService(Uuid),
}
