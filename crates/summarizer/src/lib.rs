//! Abstract interface for incident summary generation.
//!
//! Summaries come from a third-party text-generation service consumed as
//! an opaque function of the incident and its evidence. Generation may
//! fail; the core surfaces the failure to the caller and never retries,
//! summaries are requested after the fact and block nothing.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use async_trait::async_trait;
use vigil_types::{Incident, Service, StatusLogEntry};

/// Trait for summary generators.
#[async_trait]
pub trait Summarizer: Clone + Send + Sync + 'static {
    /// Produces a free-text summary of an incident from its record and the
    /// chronologically ordered log entries that span it.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing service is unavailable or rejects
    /// the request. Callers decide whether and when to retry.
    async fn summarize(
        &self,
        incident: &Incident,
        service: &Service,
        entries: &[StatusLogEntry],
    ) -> Result<String>;

    /// Produces a free-text health report for a service from the
    /// chronologically ordered log entries of a recent window. Callers
    /// guarantee `entries` is non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing service is unavailable or rejects
    /// the request.
    async fn summarize_health(
        &self,
        service: &Service,
        entries: &[StatusLogEntry],
    ) -> Result<String>;
}
