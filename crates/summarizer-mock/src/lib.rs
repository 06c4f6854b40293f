//! Deterministic summarizer for local development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use async_trait::async_trait;
use vigil_summarizer::{Error, Result, Summarizer};
use vigil_types::{Incident, ProbeStatus, Service, StatusLogEntry};

/// Summarizer that formats a short report from the evidence instead of
/// calling a text-generation service. Can be configured to fail, for
/// exercising the failure path.
#[derive(Clone, Debug, Default)]
pub struct MockSummarizer {
    failing: bool,
}

impl MockSummarizer {
    /// Creates a summarizer that always succeeds.
    #[must_use]
    pub const fn new() -> Self {
        Self { failing: false }
    }

    /// Creates a summarizer that always fails.
    #[must_use]
    pub const fn failing() -> Self {
        Self { failing: true }
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        incident: &Incident,
        service: &Service,
        entries: &[StatusLogEntry],
    ) -> Result<String> {
        if self.failing {
            return Err(Error::Generation("mock summarizer set to fail".into()));
        }

        let down_count = entries
            .iter()
            .filter(|entry| entry.status == ProbeStatus::Down)
            .count();

        let span = incident.end_time.map_or_else(
            || "ongoing".to_string(),
            |end| format!("ended {}", end.to_rfc3339()),
        );

        Ok(format!(
            "{severity:?} incident on {name}: {down_count} failed checks of {total} observed, \
             started {start}, {span}.",
            severity = incident.severity,
            name = service.name,
            total = entries.len(),
            start = incident.start_time.to_rfc3339(),
        ))
    }

    async fn summarize_health(
        &self,
        service: &Service,
        entries: &[StatusLogEntry],
    ) -> Result<String> {
        if self.failing {
            return Err(Error::Generation("mock summarizer set to fail".into()));
        }

        let up_count = entries
            .iter()
            .filter(|entry| entry.status == ProbeStatus::Up)
            .count();

        Ok(format!(
            "Health report for {name}: {up_count} of {total} checks succeeded, \
             current status {status:?}.",
            name = service.name,
            total = entries.len(),
            status = service.status,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use url::Url;
    use vigil_types::IncidentSeverity;

    fn incident_and_service() -> (Incident, Service) {
        let service = Service::new("api", Url::parse("https://api.example.com").unwrap());
        let incident = Incident::new(
            service.id,
            "Service Downtime Detected",
            "down for 6.0 minutes",
            IncidentSeverity::Low,
            Utc::now(),
            Some(Utc::now()),
        );
        (incident, service)
    }

    #[tokio::test]
    async fn summary_mentions_the_service_and_evidence() {
        let (incident, service) = incident_and_service();
        let entries = vec![StatusLogEntry::new(
            service.id,
            ProbeStatus::Down,
            None,
            Utc::now(),
        )];

        let summary = MockSummarizer::new()
            .summarize(&incident, &service, &entries)
            .await
            .unwrap();

        assert!(summary.contains("api"));
        assert!(summary.contains("1 failed checks of 1"));
    }

    #[tokio::test]
    async fn failing_mode_surfaces_an_error() {
        let (incident, service) = incident_and_service();
        let result = MockSummarizer::failing()
            .summarize(&incident, &service, &[])
            .await;
        assert!(matches!(result, Err(Error::Generation(_))));

        let health = MockSummarizer::failing()
            .summarize_health(&service, &[])
            .await;
        assert!(matches!(health, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn health_report_counts_successes() {
        let (_, service) = incident_and_service();
        let entries = vec![
            StatusLogEntry::new(service.id, ProbeStatus::Up, Some(10), Utc::now()),
            StatusLogEntry::new(service.id, ProbeStatus::Down, None, Utc::now()),
        ];

        let report = MockSummarizer::new()
            .summarize_health(&service, &entries)
            .await
            .unwrap();

        assert!(report.contains("api"));
        assert!(report.contains("1 of 2 checks succeeded"));
    }

    #[tokio::test]
    async fn ongoing_incidents_are_labelled() {
        let (mut incident, service) = incident_and_service();
        incident.end_time = None;

        let summary = MockSummarizer::new()
            .summarize(&incident, &service, &[])
            .await
            .unwrap();
        assert!(summary.contains("ongoing"));
    }
}
