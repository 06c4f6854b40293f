use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Incident, Service, ServiceStatus};

/// Events published whenever observable monitoring state changes. Consumed
/// by whatever event sink the embedding process injects; the core only
/// promises to publish, not to deliver.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum MonitorEvent {
    /// A probe completed and the service's cached snapshot was refreshed.
    /// Published once per service per tick, whether or not the status
    /// changed.
    ServiceStatusUpdated {
        /// The probed service.
        service_id: Uuid,

        /// Display name, for subscribers that don't hold the registry.
        name: String,

        /// Probed endpoint.
        url: String,

        /// Reachability after this probe.
        status: ServiceStatus,

        /// Measured latency, when the probe succeeded.
        latency_ms: Option<u64>,

        /// Rolling uptime percentage after this probe.
        uptime: f64,

        /// When the probe ran.
        last_checked: DateTime<Utc>,
    },

    /// A service was registered.
    ServiceCreated {
        /// The new service.
        service: Service,
    },

    /// A service's metadata or status was updated outside the prober.
    ServiceUpdated {
        /// The service after the update.
        service: Service,
    },

    /// A service was removed from the registry.
    ServiceDeleted {
        /// The removed service's id.
        service_id: Uuid,
    },

    /// An incident was recorded manually.
    IncidentCreated {
        /// The new incident.
        incident: Incident,
    },

    /// The detector recorded a new incident.
    IncidentDetected {
        /// The new incident.
        incident: Incident,
    },

    /// An incident record was mutated.
    IncidentUpdated {
        /// The incident after the update.
        incident: Incident,
    },

    /// An incident record was removed.
    IncidentDeleted {
        /// The removed incident's id.
        incident_id: Uuid,
    },

    /// A summary was generated and stored for an incident.
    SummaryGenerated {
        /// The summarized incident's id.
        incident_id: Uuid,

        /// The generated text.
        summary: String,
    },

    /// A retention sweep finished.
    RetentionCompleted {
        /// Number of status log entries deleted.
        deleted_count: u64,

        /// When the sweep ran.
        cleanup_date: DateTime<Utc>,

        /// Entries older than this were deleted.
        cutoff_date: DateTime<Utc>,
    },
}
