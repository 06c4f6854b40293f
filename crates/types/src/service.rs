use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Last-known reachability of a monitored service.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    /// Last probe received an HTTP 200.
    Up,

    /// Last probe failed (timeout, connection error, or non-200).
    Down,

    /// Never probed.
    Unknown,
}

/// A monitored external HTTP endpoint, along with its cached probe summary.
///
/// The status fields (`status`, `latency_ms`, `uptime`, `last_checked`) are
/// written exclusively by the prober; `name` and `url` only change through
/// the registry's own update path.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Service {
    /// The unique identifier for the service.
    pub id: Uuid,

    /// Human-readable display name.
    pub name: String,

    /// The endpoint probed on every tick.
    pub url: Url,

    /// Reachability as of the most recent probe.
    pub status: ServiceStatus,

    /// Round-trip latency of the most recent successful probe, in
    /// milliseconds. `None` when the service is down or unprobed.
    pub latency_ms: Option<u64>,

    /// Percentage of retained probes that succeeded (0–100, two decimals).
    pub uptime: f64,

    /// When the service was last probed.
    pub last_checked: Option<DateTime<Utc>>,

    /// When the service's metadata was last modified.
    pub last_updated: DateTime<Utc>,
}

impl Service {
    /// Creates a new unprobed service.
    #[must_use]
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url,
            status: ServiceStatus::Unknown,
            latency_ms: None,
            uptime: 0.0,
            last_checked: None,
            last_updated: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_service_starts_unknown() {
        let url = Url::parse("https://example.com/health").unwrap();
        let service = Service::new("example", url);

        assert_eq!(service.status, ServiceStatus::Unknown);
        assert_eq!(service.latency_ms, None);
        assert_eq!(service.last_checked, None);
        assert!((service.uptime - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&ServiceStatus::Unknown).unwrap();
        assert_eq!(json, "\"UNKNOWN\"");
    }
}
