//! Storage traits for the vigil monitoring core.
//!
//! The monitoring core never talks to a storage engine directly; any
//! backend that can satisfy these three traits (registry rows, an
//! append-only status log, incident records) works. Mutation is limited to
//! appends, single-row updates, and bulk deletion by age, so backends may
//! rely on their native per-row atomicity.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{StoreError, StoreResult};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use vigil_types::{Incident, ProbeStatus, Service, ServiceStatus, StatusLogEntry};

/// Registry of monitored services.
#[async_trait]
pub trait ServiceStore: Clone + Send + Sync + 'static {
    /// Persists a new service.
    async fn create(&self, service: Service) -> StoreResult<()>;

    /// Fetches a service by id.
    async fn get(&self, service_id: Uuid) -> StoreResult<Option<Service>>;

    /// Lists all registered services.
    async fn list(&self) -> StoreResult<Vec<Service>>;

    /// Replaces a service row. Fails with [`StoreError::NotFound`] if the
    /// service does not exist.
    async fn update(&self, service: Service) -> StoreResult<()>;

    /// Applies a probe result to the service's cached summary fields,
    /// leaving metadata untouched.
    async fn apply_probe(
        &self,
        service_id: Uuid,
        status: ServiceStatus,
        latency_ms: Option<u64>,
        uptime: f64,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Removes a service. Returns `false` if no such service existed.
    async fn delete(&self, service_id: Uuid) -> StoreResult<bool>;
}

/// Append-only time-series of probe observations.
///
/// Entries may arrive out of timestamp order across services (and, under
/// clock adjustment, within one); implementations must return range scans
/// sorted by timestamp regardless of insertion order.
#[async_trait]
pub trait StatusLogStore: Clone + Send + Sync + 'static {
    /// Appends one observation. Entries are never mutated afterwards.
    async fn append(&self, entry: StatusLogEntry) -> StoreResult<()>;

    /// All entries for a service with `from <= timestamp <= to`, ascending
    /// by timestamp.
    async fn entries_in_range(
        &self,
        service_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StatusLogEntry>>;

    /// All entries for a service with the given status and
    /// `timestamp >= from`, ascending by timestamp.
    async fn entries_with_status(
        &self,
        service_id: Uuid,
        status: ProbeStatus,
        from: DateTime<Utc>,
    ) -> StoreResult<Vec<StatusLogEntry>>;

    /// Number of retained entries for a service.
    async fn count(&self, service_id: Uuid) -> StoreResult<u64>;

    /// Total and `Up` entry counts for a service, as `(total, up)`. Both
    /// numbers come from one snapshot of the log, so a concurrent append
    /// can never be reflected in one and not the other.
    async fn counts(&self, service_id: Uuid) -> StoreResult<(u64, u64)>;

    /// Fetches entries by id, in the order given. Missing ids are skipped,
    /// callers hold weak references that retention may have invalidated.
    async fn get_many(&self, entry_ids: &[Uuid]) -> StoreResult<Vec<StatusLogEntry>>;

    /// Deletes every entry with `timestamp < cutoff`, across all services.
    /// Returns the number deleted.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

/// Incident records.
#[async_trait]
pub trait IncidentStore: Clone + Send + Sync + 'static {
    /// Persists a new incident.
    async fn create(&self, incident: Incident) -> StoreResult<()>;

    /// Fetches an incident by id.
    async fn get(&self, incident_id: Uuid) -> StoreResult<Option<Incident>>;

    /// Lists all incidents, newest first by creation time.
    async fn list(&self) -> StoreResult<Vec<Incident>>;

    /// Lists incidents for one service, newest first by creation time.
    async fn list_for_service(&self, service_id: Uuid) -> StoreResult<Vec<Incident>>;

    /// Replaces an incident row. Fails with [`StoreError::NotFound`] if the
    /// incident does not exist.
    async fn update(&self, incident: Incident) -> StoreResult<()>;

    /// Removes an incident. Returns `false` if no such incident existed.
    async fn delete(&self, incident_id: Uuid) -> StoreResult<bool>;

    /// Finds an incident for the service whose start time lies within
    /// `around ± tolerance`. Used by the detector to deduplicate candidates
    /// against incidents recorded by earlier runs.
    async fn find_started_near(
        &self,
        service_id: Uuid,
        around: DateTime<Utc>,
        tolerance: Duration,
    ) -> StoreResult<Option<Incident>>;
}
