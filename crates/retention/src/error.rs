use thiserror::Error;
use vigil_store::StoreError;

/// Result type for retention operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors passed through from the underlying log store.
    #[error(transparent)]
    Store(#[from] StoreError),
}
