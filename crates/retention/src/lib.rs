//! Status log retention for the vigil monitoring core.
//!
//! One implementation serves both the daily scheduled sweep and the
//! operator-triggered on-demand path, so the two can never drift apart in
//! cutoff semantics.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use vigil_events::EventSink;
use vigil_store::StatusLogStore;
use vigil_types::MonitorEvent;

/// Default retention horizon: entries older than seven days are deleted.
pub const DEFAULT_HORIZON_DAYS: i64 = 7;

/// Outcome of one retention sweep.
#[derive(Clone, Copy, Debug)]
pub struct RetentionReport {
    /// Number of status log entries deleted.
    pub deleted_count: u64,

    /// Entries with `timestamp < cutoff` were deleted; everything at or
    /// after it was kept.
    pub cutoff: DateTime<Utc>,
}

/// Deletes status log entries older than a configured horizon.
#[derive(Clone, Debug)]
pub struct RetentionSweep<LS, ES>
where
    LS: StatusLogStore,
    ES: EventSink,
{
    horizon: Duration,
    logs: LS,
    events: ES,
}

impl<LS, ES> RetentionSweep<LS, ES>
where
    LS: StatusLogStore,
    ES: EventSink,
{
    /// Creates a new sweep with the given horizon.
    #[must_use]
    pub const fn new(horizon: Duration, logs: LS, events: ES) -> Self {
        Self {
            horizon,
            logs,
            events,
        }
    }

    /// The cutoff a sweep started now would use.
    #[must_use]
    pub fn cutoff_now(&self) -> DateTime<Utc> {
        Utc::now() - self.horizon
    }

    /// Runs one sweep against the given cutoff and publishes a
    /// completion event. Idempotent: a second run with the same cutoff
    /// deletes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the log store rejects the deletion.
    pub async fn run(&self, cutoff: DateTime<Utc>) -> Result<RetentionReport> {
        let deleted_count = self.logs.delete_older_than(cutoff).await?;

        info!(deleted_count, %cutoff, "status log retention sweep completed");

        self.events
            .publish(MonitorEvent::RetentionCompleted {
                deleted_count,
                cleanup_date: Utc::now(),
                cutoff_date: cutoff,
            })
            .await;

        Ok(RetentionReport {
            deleted_count,
            cutoff,
        })
    }

    /// Runs one sweep with the cutoff derived from the configured horizon.
    ///
    /// # Errors
    ///
    /// Returns an error if the log store rejects the deletion.
    pub async fn run_now(&self) -> Result<RetentionReport> {
        self.run(self.cutoff_now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vigil_events_memory::BroadcastEventSink;
    use vigil_store_memory::MemoryStatusLogStore;
    use vigil_types::{ProbeStatus, StatusLogEntry};

    async fn seeded_store(service_id: Uuid, ages_days: &[i64]) -> MemoryStatusLogStore {
        let store = MemoryStatusLogStore::new();
        for &age in ages_days {
            let entry = StatusLogEntry::new(
                service_id,
                ProbeStatus::Up,
                Some(10),
                Utc::now() - Duration::days(age),
            );
            store.append(entry).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn sweep_deletes_only_entries_past_the_horizon() {
        let service_id = Uuid::new_v4();
        let store = seeded_store(service_id, &[0, 1, 6, 8, 10]).await;
        let sink = BroadcastEventSink::default();
        let sweep = RetentionSweep::new(Duration::days(7), store.clone(), sink.clone());

        let mut receiver = sink.subscribe();
        let report = sweep.run_now().await.unwrap();

        assert_eq!(report.deleted_count, 2);
        assert_eq!(store.count(service_id).await.unwrap(), 3);

        match receiver.recv().await.unwrap() {
            MonitorEvent::RetentionCompleted {
                deleted_count,
                cutoff_date,
                ..
            } => {
                assert_eq!(deleted_count, 2);
                assert_eq!(cutoff_date, report.cutoff);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sweep_is_idempotent_for_a_fixed_cutoff() {
        let service_id = Uuid::new_v4();
        let store = seeded_store(service_id, &[8, 9]).await;
        let sweep = RetentionSweep::new(
            Duration::days(7),
            store.clone(),
            BroadcastEventSink::default(),
        );

        let cutoff = Utc::now() - Duration::days(7);
        assert_eq!(sweep.run(cutoff).await.unwrap().deleted_count, 2);
        assert_eq!(sweep.run(cutoff).await.unwrap().deleted_count, 0);
    }
}
