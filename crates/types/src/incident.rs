use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Impact classification of an incident.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentSeverity {
    /// Outage shorter than ten minutes.
    Low,

    /// Outage longer than ten minutes.
    Medium,

    /// Outage longer than thirty minutes.
    High,

    /// Reserved for manually escalated incidents.
    Critical,
}

/// Lifecycle state of an incident record.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentStatus {
    /// Newly recorded, not yet triaged.
    Open,

    /// Actively being looked at.
    Investigating,

    /// Root cause addressed.
    Resolved,

    /// No further action.
    Closed,
}

/// A recorded period of service failure, created automatically by the
/// detector or manually by an operator.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Incident {
    /// The unique identifier for the incident.
    pub id: Uuid,

    /// The service this incident affects.
    pub service_id: Uuid,

    /// Short human-readable label.
    pub title: String,

    /// Free-text description of what happened.
    pub description: String,

    /// Impact classification.
    pub severity: IncidentSeverity,

    /// Lifecycle state.
    pub status: IncidentStatus,

    /// When the outage began.
    pub start_time: DateTime<Utc>,

    /// When the outage ended. `None` while ongoing.
    pub end_time: Option<DateTime<Utc>>,

    /// Ids of the status log entries that evidenced this incident. Weak
    /// references; retention may delete the entries without touching the
    /// incident.
    pub affected_logs: Vec<Uuid>,

    /// Generated summary text, if one has been requested.
    pub summary: Option<String>,

    /// When `summary` was generated.
    pub summary_generated_at: Option<DateTime<Utc>>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Creates a new open incident.
    #[must_use]
    pub fn new(
        service_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
        severity: IncidentSeverity,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            service_id,
            title: title.into(),
            description: description.into(),
            severity,
            status: IncidentStatus::Open,
            start_time,
            end_time,
            affected_logs: Vec::new(),
            summary: None,
            summary_generated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the record as mutated.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_incident_opens_without_evidence() {
        let incident = Incident::new(
            Uuid::new_v4(),
            "Service Downtime Detected",
            "probe failures",
            IncidentSeverity::Low,
            Utc::now(),
            None,
        );

        assert_eq!(incident.status, IncidentStatus::Open);
        assert!(incident.affected_logs.is_empty());
        assert!(incident.summary.is_none());
    }

    #[test]
    fn severity_ordering_tracks_impact() {
        assert!(IncidentSeverity::Low < IncidentSeverity::Medium);
        assert!(IncidentSeverity::High < IncidentSeverity::Critical);
    }
}
