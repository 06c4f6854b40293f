use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ServiceStatus;

/// Outcome of a single probe. Unlike [`crate::ServiceStatus`] there is no
/// `Unknown`: every probe either succeeds or fails.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    /// Probe received an HTTP 200.
    Up,

    /// Probe timed out, failed to connect, or received a non-200.
    Down,
}

impl From<ProbeStatus> for ServiceStatus {
    fn from(status: ProbeStatus) -> Self {
        match status {
            ProbeStatus::Up => Self::Up,
            ProbeStatus::Down => Self::Down,
        }
    }
}

/// One immutable probe observation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatusLogEntry {
    /// The unique identifier for this entry.
    pub id: Uuid,

    /// The service this observation belongs to.
    pub service_id: Uuid,

    /// Whether the probe succeeded.
    pub status: ProbeStatus,

    /// Round-trip latency in milliseconds. Present iff `status` is `Up`.
    pub latency_ms: Option<u64>,

    /// The instant the probe was issued.
    pub timestamp: DateTime<Utc>,
}

impl StatusLogEntry {
    /// Creates a new log entry. Latency is discarded for failed probes so
    /// the presence invariant holds regardless of what the caller measured.
    #[must_use]
    pub fn new(
        service_id: Uuid,
        status: ProbeStatus,
        latency_ms: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_id,
            status,
            latency_ms: match status {
                ProbeStatus::Up => latency_ms,
                ProbeStatus::Down => None,
            },
            timestamp,
        }
    }
}
