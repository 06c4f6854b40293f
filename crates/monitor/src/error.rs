use thiserror::Error;
use uuid::Uuid;
use vigil_store::StoreError;

/// Result type for monitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The scheduler was started twice.
    #[error("monitor already started")]
    AlreadyStarted,

    /// Errors passed through from the analytics aggregator.
    #[error(transparent)]
    Analytics(#[from] vigil_analytics::Error),

    /// Errors passed through from the incident detector.
    #[error(transparent)]
    Detection(#[from] vigil_detector::Error),

    /// A health summary was requested over a window with no probe
    /// observations in it.
    #[error("no observations recorded for service: {0}")]
    NoObservations(Uuid),

    /// Errors passed through from the prober.
    #[error(transparent)]
    Probe(#[from] vigil_prober::Error),

    /// Errors passed through from the retention sweep.
    #[error(transparent)]
    Retention(#[from] vigil_retention::Error),

    /// Errors passed through from the underlying stores.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Summary generation failed. Distinct so callers can tell a backend
    /// outage from their own bad input.
    #[error(transparent)]
    Summary(#[from] vigil_summarizer::Error),

    /// No incident with the given id exists.
    #[error("unknown incident: {0}")]
    UnknownIncident(Uuid),

    /// No service with the given id is registered.
    #[error("unknown service: {0}")]
    UnknownService(Uuid),
}
