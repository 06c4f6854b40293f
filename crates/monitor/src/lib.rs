//! The vigil monitoring core: an owned scheduler with an explicit
//! start/stop lifecycle, plus the on-demand operation surface an embedding
//! routing layer calls into.
//!
//! The scheduler drives two periodic tasks: probing every registered
//! service on a short cadence and sweeping old status log entries daily.
//! Everything else (analytics, incident detection, summary generation,
//! registry and incident CRUD) runs synchronously on demand and works
//! whether or not the scheduler is running, which keeps the whole surface
//! testable without waiting on real timers.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};
pub use vigil_analytics::AnalyticsReport;
pub use vigil_detector::{DetectionOptions, DetectionReport};
pub use vigil_prober::{ProbeOutcome, ProberOptions};
pub use vigil_retention::RetentionReport;

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;
use vigil_analytics::Analyzer;
use vigil_detector::Detector;
use vigil_events::EventSink;
use vigil_prober::Prober;
use vigil_retention::RetentionSweep;
use vigil_store::{IncidentStore, ServiceStore, StatusLogStore};
use vigil_summarizer::Summarizer;
use vigil_types::{
    Incident, IncidentSeverity, IncidentStatus, MonitorEvent, Service, ServiceStatus,
    StatusLogEntry,
};

/// Options for creating a [`Monitor`].
#[derive(Clone, Copy, Debug)]
pub struct MonitorOptions {
    /// How often every registered service is probed.
    pub probe_interval: Duration,

    /// Per-probe timeout.
    pub probe_timeout: Duration,

    /// Status log entries older than this are deleted by the daily sweep.
    pub retention_horizon: chrono::Duration,

    /// How often the retention sweep runs.
    pub retention_interval: Duration,

    /// Defaults for scheduled and parameterless detection runs.
    pub detection: DetectionOptions,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
            retention_horizon: chrono::Duration::days(vigil_retention::DEFAULT_HORIZON_DAYS),
            retention_interval: Duration::from_secs(24 * 60 * 60),
            detection: DetectionOptions::default(),
        }
    }
}

/// Fields of a service that may change after registration. `None` leaves
/// the current value in place.
#[derive(Clone, Debug, Default)]
pub struct ServiceUpdate {
    /// New display name.
    pub name: Option<String>,

    /// New endpoint to probe.
    pub url: Option<Url>,

    /// Manually pinned status.
    pub status: Option<ServiceStatus>,
}

/// Parameters for manually recording an incident.
#[derive(Clone, Debug)]
pub struct NewIncident {
    /// The affected service.
    pub service_id: Uuid,

    /// Short human-readable label.
    pub title: String,

    /// Free-text description.
    pub description: String,

    /// Impact classification.
    pub severity: IncidentSeverity,

    /// When the outage began.
    pub start_time: chrono::DateTime<Utc>,

    /// When the outage ended, if it has.
    pub end_time: Option<chrono::DateTime<Utc>>,
}

/// Fields of an incident that may change after creation. `None` leaves the
/// current value in place.
#[derive(Clone, Debug, Default)]
pub struct IncidentUpdate {
    /// New label.
    pub title: Option<String>,

    /// New description.
    pub description: Option<String>,

    /// New impact classification.
    pub severity: Option<IncidentSeverity>,

    /// New lifecycle state.
    pub status: Option<IncidentStatus>,

    /// New end time.
    pub end_time: Option<chrono::DateTime<Utc>>,
}

/// The monitoring core. Clone-cheap; all shared state lives behind the
/// injected stores and sink.
#[derive(Clone, Debug)]
pub struct Monitor<SS, LS, IS, ES, SM>
where
    SS: ServiceStore,
    LS: StatusLogStore,
    IS: IncidentStore,
    ES: EventSink,
    SM: Summarizer,
{
    options: MonitorOptions,
    services: SS,
    logs: LS,
    incidents: IS,
    events: ES,
    summarizer: SM,

    prober: Prober<SS, LS, ES>,
    retention: RetentionSweep<LS, ES>,
    analyzer: Analyzer<SS, LS>,
    detector: Detector<SS, LS, IS, ES>,

    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

impl<SS, LS, IS, ES, SM> Monitor<SS, LS, IS, ES, SM>
where
    SS: ServiceStore,
    LS: StatusLogStore,
    IS: IncidentStore,
    ES: EventSink,
    SM: Summarizer,
{
    /// Creates a new monitor over the given stores, sink, and summarizer.
    #[must_use]
    pub fn new(
        options: MonitorOptions,
        services: SS,
        logs: LS,
        incidents: IS,
        events: ES,
        summarizer: SM,
    ) -> Self {
        let prober = Prober::new(
            ProberOptions {
                timeout: options.probe_timeout,
            },
            services.clone(),
            logs.clone(),
            events.clone(),
        );
        let retention =
            RetentionSweep::new(options.retention_horizon, logs.clone(), events.clone());
        let analyzer = Analyzer::new(services.clone(), logs.clone());
        let detector = Detector::new(
            services.clone(),
            logs.clone(),
            incidents.clone(),
            events.clone(),
        );

        Self {
            options,
            services,
            logs,
            incidents,
            events,
            summarizer,
            prober,
            retention,
            analyzer,
            detector,
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// Starts the probe and retention loops.
    ///
    /// Ticks are anchored to the interval, not to probe duration: each
    /// tick's fan-out runs as its own tracked task, so a hung probe can
    /// never push the next tick past the configured cadence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] on a second call.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let probe_loop = {
            let prober = self.prober.clone();
            let shutdown_token = self.shutdown_token.clone();
            let task_tracker = self.task_tracker.clone();
            let period = self.options.probe_interval;

            self.task_tracker.spawn(async move {
                let mut interval = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        () = shutdown_token.cancelled() => break,
                        _ = interval.tick() => {
                            let prober = prober.clone();
                            task_tracker.spawn(async move {
                                match prober.probe_all().await {
                                    Ok(results) => {
                                        let failed = results
                                            .iter()
                                            .filter(|(_, result)| result.is_err())
                                            .count();
                                        if failed > 0 {
                                            warn!(failed, "probe cycle finished with store failures");
                                        }
                                    }
                                    Err(error) => error!(%error, "probe cycle could not list services"),
                                }
                            });
                        }
                    }
                }
            })
        };

        {
            let retention = self.retention.clone();
            let shutdown_token = self.shutdown_token.clone();
            let period = self.options.retention_interval;

            self.task_tracker.spawn(async move {
                // First sweep happens one period in, not at startup.
                let start = tokio::time::Instant::now() + period;
                let mut interval = tokio::time::interval_at(start, period);
                loop {
                    tokio::select! {
                        () = shutdown_token.cancelled() => break,
                        _ = interval.tick() => {
                            if let Err(error) = retention.run_now().await {
                                error!(%error, "scheduled retention sweep failed");
                            }
                        }
                    }
                }
            });
        }

        self.task_tracker.close();
        info!(
            probe_interval_secs = self.options.probe_interval.as_secs(),
            "monitor scheduler started"
        );

        Ok(probe_loop)
    }

    /// Stops the scheduler and waits for in-flight probes to finish or
    /// time out.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();
        self.task_tracker.close();
        self.task_tracker.wait().await;
        info!("monitor scheduler stopped");
    }

    /// Waits for the scheduler to exit.
    pub async fn wait(&self) {
        self.task_tracker.wait().await;
    }

    // --- on-demand monitoring operations ---

    /// Probes every registered service once, right now. Per-service
    /// failures are collected, not propagated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the registry cannot be listed.
    pub async fn probe_now(&self) -> Result<Vec<(Uuid, vigil_prober::Result<StatusLogEntry>)>> {
        Ok(self.prober.probe_all().await?)
    }

    /// Runs a retention sweep with the configured horizon, right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the log store rejects the deletion.
    pub async fn run_retention_now(&self) -> Result<RetentionReport> {
        Ok(self.retention.run_now().await?)
    }

    /// Computes analytics for one service over the last `window_days`.
    ///
    /// # Errors
    ///
    /// Rejects unknown services and zero-day windows; an empty window is
    /// a well-formed `NoData` report.
    pub async fn analytics(&self, service_id: Uuid, window_days: u32) -> Result<AnalyticsReport> {
        Ok(self.analyzer.compute(service_id, window_days).await?)
    }

    /// Runs incident detection for one service.
    ///
    /// # Errors
    ///
    /// Rejects unknown services and malformed options; store failures pass
    /// through.
    pub async fn detect_incidents(
        &self,
        service_id: Uuid,
        options: Option<DetectionOptions>,
    ) -> Result<DetectionReport> {
        let options = options.unwrap_or(self.options.detection);
        Ok(self.detector.detect(service_id, options).await?)
    }

    /// Generates and persists a summary for an incident, returning the
    /// text. Generation failure leaves the incident untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIncident`] / [`Error::UnknownService`] for
    /// dangling ids and [`Error::Summary`] when the generator fails.
    pub async fn generate_summary(&self, incident_id: Uuid) -> Result<String> {
        let mut incident = self
            .incidents
            .get(incident_id)
            .await?
            .ok_or(Error::UnknownIncident(incident_id))?;

        let service = self
            .services
            .get(incident.service_id)
            .await?
            .ok_or(Error::UnknownService(incident.service_id))?;

        let until = incident.end_time.unwrap_or_else(Utc::now);
        let entries = self
            .logs
            .entries_in_range(incident.service_id, incident.start_time, until)
            .await?;

        let summary = self
            .summarizer
            .summarize(&incident, &service, &entries)
            .await?;

        incident.summary = Some(summary.clone());
        incident.summary_generated_at = Some(Utc::now());
        incident.touch();
        self.incidents.update(incident).await?;

        self.events
            .publish(MonitorEvent::SummaryGenerated {
                incident_id,
                summary: summary.clone(),
            })
            .await;

        Ok(summary)
    }

    /// Generates a free-text health report for a service over the last
    /// `window_days` of observations. Nothing is persisted; the text is
    /// returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] for unregistered ids,
    /// [`Error::NoObservations`] when the window holds no entries, and
    /// [`Error::Summary`] when the generator fails.
    pub async fn service_health_summary(
        &self,
        service_id: Uuid,
        window_days: u32,
    ) -> Result<String> {
        let service = self.get_service(service_id).await?;

        let now = Utc::now();
        let from = now - chrono::Duration::days(i64::from(window_days));
        let entries = self.logs.entries_in_range(service_id, from, now).await?;

        if entries.is_empty() {
            return Err(Error::NoObservations(service_id));
        }

        Ok(self.summarizer.summarize_health(&service, &entries).await?)
    }

    // --- service registry ---

    /// Registers a new service and publishes the creation event.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the write.
    pub async fn create_service(&self, name: impl Into<String> + Send, url: Url) -> Result<Service> {
        let service = Service::new(name, url);
        self.services.create(service.clone()).await?;

        self.events
            .publish(MonitorEvent::ServiceCreated {
                service: service.clone(),
            })
            .await;

        Ok(service)
    }

    /// Fetches a service by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] if no such service exists.
    pub async fn get_service(&self, service_id: Uuid) -> Result<Service> {
        self.services
            .get(service_id)
            .await?
            .ok_or(Error::UnknownService(service_id))
    }

    /// Lists all registered services.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        Ok(self.services.list().await?)
    }

    /// Applies a metadata/status update to a service, refreshing its
    /// `last_updated` stamp and publishing the update event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] if no such service exists.
    pub async fn update_service(&self, service_id: Uuid, update: ServiceUpdate) -> Result<Service> {
        let mut service = self.get_service(service_id).await?;

        if let Some(name) = update.name {
            service.name = name;
        }
        if let Some(url) = update.url {
            service.url = url;
        }
        if let Some(status) = update.status {
            service.status = status;
        }
        service.last_updated = Utc::now();

        self.services.update(service.clone()).await?;
        self.events
            .publish(MonitorEvent::ServiceUpdated {
                service: service.clone(),
            })
            .await;

        Ok(service)
    }

    /// Removes a service from the registry. Its status log entries and
    /// incidents stay behind; nothing cascades.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] if no such service exists.
    pub async fn delete_service(&self, service_id: Uuid) -> Result<()> {
        if !self.services.delete(service_id).await? {
            return Err(Error::UnknownService(service_id));
        }

        self.events
            .publish(MonitorEvent::ServiceDeleted { service_id })
            .await;

        Ok(())
    }

    // --- incidents ---

    /// Records an incident manually and publishes the creation event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] if the referenced service is not
    /// registered.
    pub async fn create_incident(&self, new: NewIncident) -> Result<Incident> {
        // Validate the reference before writing anything.
        self.get_service(new.service_id).await?;

        let incident = Incident::new(
            new.service_id,
            new.title,
            new.description,
            new.severity,
            new.start_time,
            new.end_time,
        );
        self.incidents.create(incident.clone()).await?;

        self.events
            .publish(MonitorEvent::IncidentCreated {
                incident: incident.clone(),
            })
            .await;

        Ok(incident)
    }

    /// Fetches an incident by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIncident`] if no such incident exists.
    pub async fn get_incident(&self, incident_id: Uuid) -> Result<Incident> {
        self.incidents
            .get(incident_id)
            .await?
            .ok_or(Error::UnknownIncident(incident_id))
    }

    /// Lists all incidents, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the incident store cannot be read.
    pub async fn list_incidents(&self) -> Result<Vec<Incident>> {
        Ok(self.incidents.list().await?)
    }

    /// Lists incidents affecting one service, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] if no such service exists.
    pub async fn list_service_incidents(&self, service_id: Uuid) -> Result<Vec<Incident>> {
        self.get_service(service_id).await?;
        Ok(self.incidents.list_for_service(service_id).await?)
    }

    /// Resolves an incident's evidence list to the entries that still
    /// exist. Entries aged out by retention are silently absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIncident`] if no such incident exists.
    pub async fn incident_evidence(&self, incident_id: Uuid) -> Result<Vec<StatusLogEntry>> {
        let incident = self.get_incident(incident_id).await?;
        Ok(self.logs.get_many(&incident.affected_logs).await?)
    }

    /// Applies an update to an incident, refreshing its `updated_at` stamp
    /// and publishing the update event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIncident`] if no such incident exists.
    pub async fn update_incident(
        &self,
        incident_id: Uuid,
        update: IncidentUpdate,
    ) -> Result<Incident> {
        let mut incident = self.get_incident(incident_id).await?;

        if let Some(title) = update.title {
            incident.title = title;
        }
        if let Some(description) = update.description {
            incident.description = description;
        }
        if let Some(severity) = update.severity {
            incident.severity = severity;
        }
        if let Some(status) = update.status {
            incident.status = status;
        }
        if let Some(end_time) = update.end_time {
            incident.end_time = Some(end_time);
        }
        incident.touch();

        self.incidents.update(incident.clone()).await?;
        self.events
            .publish(MonitorEvent::IncidentUpdated {
                incident: incident.clone(),
            })
            .await;

        Ok(incident)
    }

    /// Removes an incident record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownIncident`] if no such incident exists.
    pub async fn delete_incident(&self, incident_id: Uuid) -> Result<()> {
        if !self.incidents.delete(incident_id).await? {
            return Err(Error::UnknownIncident(incident_id));
        }

        self.events
            .publish(MonitorEvent::IncidentDeleted { incident_id })
            .await;

        Ok(())
    }
}
