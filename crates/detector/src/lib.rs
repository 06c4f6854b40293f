//! Clusters failure observations into incident records.
//!
//! Raw `Down` observations arrive one per probe interval; the detector
//! walks them chronologically, merges observations separated by no more
//! than a small gap into one cluster, discards clusters shorter than a
//! duration threshold as transient noise, and records the survivors as
//! incidents, skipping any outage an earlier run already recorded.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use vigil_events::EventSink;
use vigil_store::{IncidentStore, ServiceStore, StatusLogStore};
use vigil_types::{Incident, IncidentSeverity, MonitorEvent, ProbeStatus, StatusLogEntry};

/// Title given to every automatically detected incident.
pub const AUTO_INCIDENT_TITLE: &str = "Service Downtime Detected";

/// Two candidate start times within this tolerance refer to the same
/// outage. Absorbs clock and scheduling jitter between overlapping runs.
const DEDUP_TOLERANCE_SECONDS: i64 = 60;

/// Options for one detection run.
#[derive(Clone, Copy, Debug)]
pub struct DetectionOptions {
    /// Clusters shorter than this many minutes are discarded as noise.
    pub threshold_minutes: u32,

    /// How far back to scan for failure observations.
    pub lookback_hours: u32,

    /// Observations separated by no more than this many minutes belong to
    /// the same cluster. With one probe per minute, two minutes absorbs a
    /// single missed or delayed probe.
    pub merge_gap_minutes: u32,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            threshold_minutes: 5,
            lookback_hours: 24,
            merge_gap_minutes: 2,
        }
    }
}

/// Summary of one detection run.
#[derive(Clone, Debug)]
pub struct DetectionReport {
    /// Clusters that met the duration threshold, whether or not they were
    /// already recorded.
    pub candidates: u64,

    /// Incidents this run actually created. Candidates missing from this
    /// list were already known.
    pub created: Vec<Incident>,
}

/// A maximal run of `Down` observations separated by gaps no larger than
/// the merge tolerance.
#[derive(Clone, Debug)]
struct Cluster {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    entries: Vec<StatusLogEntry>,
}

impl Cluster {
    fn open(entry: StatusLogEntry) -> Self {
        Self {
            start: entry.timestamp,
            end: entry.timestamp,
            entries: vec![entry],
        }
    }

    fn join(&mut self, entry: StatusLogEntry) {
        self.end = entry.timestamp;
        self.entries.push(entry);
    }

    fn duration_minutes(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let seconds = (self.end - self.start).num_seconds() as f64;
        seconds / 60.0
    }
}

/// Detects incidents from recent failure observations.
#[derive(Clone, Debug)]
pub struct Detector<SS, LS, IS, ES>
where
    SS: ServiceStore,
    LS: StatusLogStore,
    IS: IncidentStore,
    ES: EventSink,
{
    services: SS,
    logs: LS,
    incidents: IS,
    events: ES,

    /// Per-service guards serializing the check-then-create sequence, so
    /// overlapping runs cannot record the same outage twice.
    guards: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl<SS, LS, IS, ES> Detector<SS, LS, IS, ES>
where
    SS: ServiceStore,
    LS: StatusLogStore,
    IS: IncidentStore,
    ES: EventSink,
{
    /// Creates a new detector over the given stores and sink.
    #[must_use]
    pub fn new(services: SS, logs: LS, incidents: IS, events: ES) -> Self {
        Self {
            services,
            logs,
            incidents,
            events,
            guards: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs one detection pass for a service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] for unregistered ids,
    /// [`Error::InvalidOptions`] for zero thresholds or lookbacks, and
    /// store errors as-is. A window with no failures yields an empty
    /// report, not an error.
    pub async fn detect(
        &self,
        service_id: Uuid,
        options: DetectionOptions,
    ) -> Result<DetectionReport> {
        if options.threshold_minutes == 0 {
            return Err(Error::InvalidOptions(
                "threshold must be at least one minute".into(),
            ));
        }
        if options.lookback_hours == 0 {
            return Err(Error::InvalidOptions(
                "lookback must be at least one hour".into(),
            ));
        }

        if self.services.get(service_id).await?.is_none() {
            return Err(Error::UnknownService(service_id));
        }

        let guard = self.guard_for(service_id).await;
        let _held = guard.lock().await;

        let from = Utc::now() - Duration::hours(i64::from(options.lookback_hours));
        let down_entries = self
            .logs
            .entries_with_status(service_id, ProbeStatus::Down, from)
            .await?;

        let clusters = cluster(down_entries, options);
        let candidates = clusters.len() as u64;

        let mut created = Vec::new();
        for candidate in clusters {
            if let Some(incident) = self.record(service_id, candidate).await? {
                created.push(incident);
            }
        }

        info!(
            %service_id,
            candidates,
            created = created.len(),
            "incident detection completed"
        );

        Ok(DetectionReport {
            candidates,
            created,
        })
    }

    /// Records one accepted cluster, unless an incident for the same
    /// outage already exists.
    async fn record(&self, service_id: Uuid, candidate: Cluster) -> Result<Option<Incident>> {
        let existing = self
            .incidents
            .find_started_near(
                service_id,
                candidate.start,
                Duration::seconds(DEDUP_TOLERANCE_SECONDS),
            )
            .await?;

        if let Some(existing) = existing {
            debug!(
                %service_id,
                incident_id = %existing.id,
                "outage already recorded, skipping"
            );
            return Ok(None);
        }

        let duration = candidate.duration_minutes();

        let mut incident = Incident::new(
            service_id,
            AUTO_INCIDENT_TITLE,
            format!("Automated incident detection: Service was down for {duration:.1} minutes"),
            severity_for(duration),
            candidate.start,
            Some(candidate.end),
        );
        incident.affected_logs = candidate.entries.iter().map(|entry| entry.id).collect();

        self.incidents.create(incident.clone()).await?;
        self.events
            .publish(MonitorEvent::IncidentDetected {
                incident: incident.clone(),
            })
            .await;

        Ok(Some(incident))
    }

    async fn guard_for(&self, service_id: Uuid) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        guards.entry(service_id).or_default().clone()
    }
}

/// Walks chronologically ordered `Down` entries once, producing the
/// clusters that meet the duration threshold.
fn cluster(entries: Vec<StatusLogEntry>, options: DetectionOptions) -> Vec<Cluster> {
    let merge_gap = f64::from(options.merge_gap_minutes);
    let threshold = f64::from(options.threshold_minutes);

    let mut accepted = Vec::new();
    let mut current: Option<Cluster> = None;

    for entry in entries {
        let Some(mut open) = current.take() else {
            current = Some(Cluster::open(entry));
            continue;
        };

        #[allow(clippy::cast_precision_loss)]
        let gap_minutes = (entry.timestamp - open.end).num_seconds() as f64 / 60.0;

        if gap_minutes <= merge_gap {
            open.join(entry);
            current = Some(open);
        } else {
            if open.duration_minutes() >= threshold {
                accepted.push(open);
            }
            current = Some(Cluster::open(entry));
        }
    }

    if let Some(cluster) = current {
        if cluster.duration_minutes() >= threshold {
            accepted.push(cluster);
        }
    }

    accepted
}

/// Severity scales with outage duration: over thirty minutes is high,
/// over ten is medium, anything else is low.
fn severity_for(duration_minutes: f64) -> IncidentSeverity {
    if duration_minutes > 30.0 {
        IncidentSeverity::High
    } else if duration_minutes > 10.0 {
        IncidentSeverity::Medium
    } else {
        IncidentSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn down_at(service_id: Uuid, minute: u32) -> StatusLogEntry {
        let timestamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap();
        StatusLogEntry::new(service_id, ProbeStatus::Down, None, timestamp)
    }

    fn entries(minutes: &[u32]) -> Vec<StatusLogEntry> {
        let service_id = Uuid::new_v4();
        minutes.iter().map(|&m| down_at(service_id, m)).collect()
    }

    #[test]
    fn short_clusters_are_discarded_as_noise() {
        // 0–2 (2min), 10–11 (1min), 20 (0min): all below the 5min threshold.
        let clusters = cluster(entries(&[0, 1, 2, 10, 11, 20]), DetectionOptions::default());
        assert!(clusters.is_empty());
    }

    #[test]
    fn contiguous_failures_form_one_accepted_cluster() {
        let clusters = cluster(
            entries(&[0, 1, 2, 3, 4, 5, 6]),
            DetectionOptions::default(),
        );

        assert_eq!(clusters.len(), 1);
        let only = &clusters[0];
        assert_eq!(only.entries.len(), 7);
        assert!((only.duration_minutes() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gap_over_two_minutes_splits_clusters() {
        // Two runs of six minutes each, nine minutes apart.
        let clusters = cluster(
            entries(&[0, 1, 2, 3, 4, 5, 6, 15, 16, 17, 18, 19, 20, 21]),
            DetectionOptions::default(),
        );

        assert_eq!(clusters.len(), 2);
        assert_eq!(
            clusters[0].end,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 6, 0).unwrap()
        );
        assert_eq!(
            clusters[1].start,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 15, 0).unwrap()
        );
    }

    #[test]
    fn severity_scales_with_duration() {
        assert_eq!(severity_for(6.0), IncidentSeverity::Low);
        assert_eq!(severity_for(10.0), IncidentSeverity::Low);
        assert_eq!(severity_for(10.1), IncidentSeverity::Medium);
        assert_eq!(severity_for(30.0), IncidentSeverity::Medium);
        assert_eq!(severity_for(31.0), IncidentSeverity::High);
    }
}
