//! HTTP probing for the vigil monitoring core.
//!
//! On every scheduler tick the prober issues one bounded-timeout GET per
//! registered service, appends the observation to the status log,
//! recomputes the service's rolling uptime over its full retained history,
//! refreshes the registry's cached snapshot, and publishes a status event.
//! Probes within a tick are independent: a hung endpoint affects only its
//! own service.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::time::{Duration, Instant};

use chrono::Utc;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};
use uuid::Uuid;
use vigil_events::EventSink;
use vigil_store::{ServiceStore, StatusLogStore};
use vigil_types::{MonitorEvent, ProbeStatus, Service, StatusLogEntry};

/// Options for creating a [`Prober`].
#[derive(Clone, Copy, Debug)]
pub struct ProberOptions {
    /// Per-probe timeout. A probe exceeding it records `Down`, exactly as
    /// a refused connection would.
    pub timeout: Duration,
}

/// Cap on concurrently in-flight probes within one cycle, so a large
/// registry cannot fan out without bound.
const MAX_IN_FLIGHT_PROBES: usize = 32;

impl Default for ProberOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

/// Result of one reachability check, before it is recorded.
#[derive(Clone, Copy, Debug)]
pub struct ProbeOutcome {
    /// Whether the endpoint answered with HTTP 200.
    pub status: ProbeStatus,

    /// Measured round-trip latency in milliseconds, for successful probes.
    pub latency_ms: Option<u64>,
}

/// Issues probes and records their observations.
#[derive(Clone, Debug)]
pub struct Prober<SS, LS, ES>
where
    SS: ServiceStore,
    LS: StatusLogStore,
    ES: EventSink,
{
    client: Client,
    timeout: Duration,
    services: SS,
    logs: LS,
    events: ES,
}

impl<SS, LS, ES> Prober<SS, LS, ES>
where
    SS: ServiceStore,
    LS: StatusLogStore,
    ES: EventSink,
{
    /// Creates a new prober over the given stores and sink.
    #[must_use]
    pub fn new(options: ProberOptions, services: SS, logs: LS, events: ES) -> Self {
        Self {
            client: Client::new(),
            timeout: options.timeout,
            services,
            logs,
            events,
        }
    }

    /// Checks a service once. Any failure (timeout, connection error, or
    /// a non-200 response) is a `Down` observation, never an error.
    pub async fn probe_once(&self, service: &Service) -> ProbeOutcome {
        let started = Instant::now();

        let response = self
            .client
            .get(service.url.as_str())
            .timeout(self.timeout)
            .send()
            .await;

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match response {
            Ok(response) if response.status() == reqwest::StatusCode::OK => ProbeOutcome {
                status: ProbeStatus::Up,
                latency_ms: Some(latency_ms),
            },
            Ok(response) => {
                debug!(
                    service = %service.name,
                    status = %response.status(),
                    "probe got non-200 response"
                );
                ProbeOutcome {
                    status: ProbeStatus::Down,
                    latency_ms: None,
                }
            }
            Err(error) => {
                debug!(service = %service.name, %error, "probe failed");
                ProbeOutcome {
                    status: ProbeStatus::Down,
                    latency_ms: None,
                }
            }
        }
    }

    /// Appends one observation to the status log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log store rejects the write.
    pub async fn record_status(
        &self,
        service_id: Uuid,
        status: ProbeStatus,
        latency_ms: Option<u64>,
        timestamp: chrono::DateTime<Utc>,
    ) -> Result<StatusLogEntry> {
        let entry = StatusLogEntry::new(service_id, status, latency_ms, timestamp);
        self.logs.append(entry.clone()).await?;
        Ok(entry)
    }

    /// Rolling uptime over the service's entire retained history:
    /// `up / total * 100`, two decimal places. Zero when nothing is
    /// retained. Uptime degrades smoothly as retention ages out old
    /// entries; there is no fixed window here.
    ///
    /// # Errors
    ///
    /// Returns an error if the log store cannot be read.
    pub async fn compute_uptime(&self, service_id: Uuid) -> Result<f64> {
        // Both counts from one log snapshot; an append landing mid-read
        // must never inflate the ratio past the true history.
        let (total, up) = self.logs.counts(service_id).await?;
        if total == 0 {
            return Ok(0.0);
        }

        #[allow(clippy::cast_precision_loss)]
        let uptime = (up as f64 / total as f64) * 100.0;
        Ok(round_two(uptime))
    }

    /// Probes one service end to end: check, record, recompute uptime,
    /// refresh the cached snapshot, publish the status event.
    ///
    /// # Errors
    ///
    /// Returns an error if any store operation fails. Probe failure itself
    /// is recorded as `Down` and is not an error.
    pub async fn probe_service(&self, service: &Service) -> Result<StatusLogEntry> {
        let checked_at = Utc::now();
        let outcome = self.probe_once(service).await;

        let entry = self
            .record_status(service.id, outcome.status, outcome.latency_ms, checked_at)
            .await?;

        let uptime = self.compute_uptime(service.id).await?;

        self.services
            .apply_probe(
                service.id,
                outcome.status.into(),
                outcome.latency_ms,
                uptime,
                checked_at,
            )
            .await?;

        self.events
            .publish(MonitorEvent::ServiceStatusUpdated {
                service_id: service.id,
                name: service.name.clone(),
                url: service.url.to_string(),
                status: outcome.status.into(),
                latency_ms: outcome.latency_ms,
                uptime,
                last_checked: checked_at,
            })
            .await;

        Ok(entry)
    }

    /// Probes every registered service concurrently. Per-service failures
    /// are isolated and reported alongside the successes; one broken
    /// service never aborts the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error only if the registry itself cannot be listed.
    pub async fn probe_all(&self) -> Result<Vec<(Uuid, Result<StatusLogEntry>)>> {
        let services = self.services.list().await?;

        let results = futures::stream::iter(services.into_iter().map(|service| async move {
            let result = self.probe_service(&service).await;

            if let Err(error) = &result {
                warn!(service = %service.name, %error, "probe cycle failed for service");
            }

            (service.id, result)
        }))
        .buffer_unordered(MAX_IN_FLIGHT_PROBES)
        .collect::<Vec<_>>()
        .await;

        Ok(results)
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round_two;

    #[test]
    fn rounding_is_two_decimal() {
        assert!((round_two(2.0 / 3.0 * 100.0) - 66.67).abs() < f64::EPSILON);
        assert!((round_two(100.0) - 100.0).abs() < f64::EPSILON);
        assert!((round_two(1.0 / 3.0 * 100.0) - 33.33).abs() < f64::EPSILON);
    }
}
