use thiserror::Error;
use vigil_store::StoreError;

/// Result type for prober operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
///
/// Probe failures are not errors; a timeout or refused connection is a
/// `Down` observation. Only the storage layer can make a probe cycle fail.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors passed through from the underlying stores.
    #[error(transparent)]
    Store(#[from] StoreError),
}
