//! Rolling uptime, latency, and trend analytics over the status log.
//!
//! All computation happens on demand over a lookback window; nothing is
//! pre-aggregated. An empty window is a well-defined [`AnalyticsReport::NoData`],
//! never a division by zero.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_store::{ServiceStore, StatusLogStore};
use vigil_types::{ProbeStatus, StatusLogEntry};

/// Trend buckets never exceed this many calendar days, regardless of the
/// requested window.
pub const MAX_DAILY_BUCKETS: usize = 30;

/// One UTC-calendar-day trend bucket.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct DailyBucket {
    /// The UTC date this bucket covers.
    pub date: NaiveDate,

    /// Uptime percentage for that day, two decimals.
    pub uptime_pct: f64,

    /// Average latency for that day over successful probes, milliseconds.
    pub avg_latency_ms: f64,

    /// Total probes recorded that day.
    pub total_checks: u64,
}

/// Aggregated statistics for one service over a lookback window.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServiceAnalytics {
    /// Total probes in the window.
    pub total_checks: u64,

    /// Probes that succeeded.
    pub up_count: u64,

    /// Probes that failed.
    pub down_count: u64,

    /// `up_count / total_checks * 100`, two decimals.
    pub uptime_pct: f64,

    /// `down_count / total_checks * 100`, two decimals.
    pub downtime_pct: f64,

    /// Mean latency over probes that carried one; zero when none did.
    pub avg_latency_ms: f64,

    /// Longest chronological run of consecutive failed probes.
    pub longest_down_streak: u64,

    /// Per-day trend, chronological, capped to the most recent
    /// [`MAX_DAILY_BUCKETS`] days.
    pub daily: Vec<DailyBucket>,
}

/// Result of an analytics computation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsReport {
    /// The window contained no observations.
    NoData,

    /// Aggregates over a non-empty window.
    Data(ServiceAnalytics),
}

/// Computes on-demand analytics over the status log.
#[derive(Clone, Debug)]
pub struct Analyzer<SS, LS>
where
    SS: ServiceStore,
    LS: StatusLogStore,
{
    services: SS,
    logs: LS,
}

impl<SS, LS> Analyzer<SS, LS>
where
    SS: ServiceStore,
    LS: StatusLogStore,
{
    /// Creates a new analyzer over the given stores.
    #[must_use]
    pub const fn new(services: SS, logs: LS) -> Self {
        Self { services, logs }
    }

    /// Computes analytics for one service over the last `window_days` days.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownService`] for unregistered ids,
    /// [`Error::InvalidWindow`] for a zero-day window, and store errors
    /// as-is. An empty window is `Ok(AnalyticsReport::NoData)`.
    pub async fn compute(&self, service_id: Uuid, window_days: u32) -> Result<AnalyticsReport> {
        if window_days == 0 {
            return Err(Error::InvalidWindow(window_days));
        }

        if self.services.get(service_id).await?.is_none() {
            return Err(Error::UnknownService(service_id));
        }

        let now = Utc::now();
        let from = now - Duration::days(i64::from(window_days));
        let entries = self.logs.entries_in_range(service_id, from, now).await?;

        if entries.is_empty() {
            return Ok(AnalyticsReport::NoData);
        }

        Ok(AnalyticsReport::Data(aggregate(&entries)))
    }
}

/// Aggregates a non-empty, chronologically ordered slice of entries.
fn aggregate(entries: &[StatusLogEntry]) -> ServiceAnalytics {
    let total_checks = entries.len() as u64;
    let up_count = entries
        .iter()
        .filter(|entry| entry.status == ProbeStatus::Up)
        .count() as u64;
    let down_count = total_checks - up_count;

    let mut streak = 0u64;
    let mut longest_down_streak = 0u64;
    for entry in entries {
        if entry.status == ProbeStatus::Down {
            streak += 1;
            longest_down_streak = longest_down_streak.max(streak);
        } else {
            streak = 0;
        }
    }

    ServiceAnalytics {
        total_checks,
        up_count,
        down_count,
        uptime_pct: percentage(up_count, total_checks),
        downtime_pct: percentage(down_count, total_checks),
        avg_latency_ms: average_latency(entries),
        longest_down_streak,
        daily: daily_buckets(entries),
    }
}

/// Groups entries into UTC calendar-day buckets, chronological, keeping
/// only the most recent [`MAX_DAILY_BUCKETS`].
fn daily_buckets(entries: &[StatusLogEntry]) -> Vec<DailyBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<&StatusLogEntry>> = BTreeMap::new();
    for entry in entries {
        days.entry(entry.timestamp.date_naive()).or_default().push(entry);
    }

    let skip = days.len().saturating_sub(MAX_DAILY_BUCKETS);

    days.into_iter()
        .skip(skip)
        .map(|(date, day_entries)| {
            let total = day_entries.len() as u64;
            let up = day_entries
                .iter()
                .filter(|entry| entry.status == ProbeStatus::Up)
                .count() as u64;

            let latencies: Vec<u64> =
                day_entries.iter().filter_map(|entry| entry.latency_ms).collect();
            #[allow(clippy::cast_precision_loss)]
            let avg_latency_ms = if latencies.is_empty() {
                0.0
            } else {
                round_two(latencies.iter().sum::<u64>() as f64 / latencies.len() as f64)
            };

            DailyBucket {
                date,
                uptime_pct: percentage(up, total),
                avg_latency_ms,
                total_checks: total,
            }
        })
        .collect()
}

fn average_latency(entries: &[StatusLogEntry]) -> f64 {
    let latencies: Vec<u64> = entries.iter().filter_map(|entry| entry.latency_ms).collect();
    if latencies.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
    round_two(mean)
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: u64, total: u64) -> f64 {
    round_two(part as f64 / total as f64 * 100.0)
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn entry(
        service_id: Uuid,
        status: ProbeStatus,
        latency_ms: Option<u64>,
        at: DateTime<Utc>,
    ) -> StatusLogEntry {
        StatusLogEntry::new(service_id, status, latency_ms, at)
    }

    fn at(day: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, minute, 0).unwrap()
    }

    #[test]
    fn aggregates_counts_and_percentages() {
        let service_id = Uuid::new_v4();
        let entries = vec![
            entry(service_id, ProbeStatus::Up, Some(10), at(1, 0)),
            entry(service_id, ProbeStatus::Up, Some(20), at(1, 1)),
            entry(service_id, ProbeStatus::Down, None, at(1, 2)),
        ];

        let analytics = aggregate(&entries);
        assert_eq!(analytics.total_checks, 3);
        assert_eq!(analytics.up_count, 2);
        assert_eq!(analytics.down_count, 1);
        assert!((analytics.uptime_pct - 66.67).abs() < f64::EPSILON);
        assert!((analytics.downtime_pct - 33.33).abs() < f64::EPSILON);
        assert!((analytics.avg_latency_ms - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn down_streak_resets_on_up() {
        let service_id = Uuid::new_v4();
        let statuses = [
            ProbeStatus::Down,
            ProbeStatus::Down,
            ProbeStatus::Up,
            ProbeStatus::Down,
            ProbeStatus::Down,
            ProbeStatus::Down,
            ProbeStatus::Up,
        ];
        let entries: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| entry(service_id, status, None, at(1, u32::try_from(i).unwrap())))
            .collect();

        assert_eq!(aggregate(&entries).longest_down_streak, 3);
    }

    #[test]
    fn all_down_history_has_zero_average_latency() {
        let service_id = Uuid::new_v4();
        let entries = vec![
            entry(service_id, ProbeStatus::Down, None, at(1, 0)),
            entry(service_id, ProbeStatus::Down, None, at(1, 1)),
        ];

        let analytics = aggregate(&entries);
        assert!((analytics.avg_latency_ms - 0.0).abs() < f64::EPSILON);
        assert!((analytics.uptime_pct - 0.0).abs() < f64::EPSILON);
        assert_eq!(analytics.longest_down_streak, 2);
    }

    #[test]
    fn daily_buckets_are_chronological_and_capped() {
        let service_id = Uuid::new_v4();
        // 31 days of data in June/July; only the most recent 30 survive.
        let entries: Vec<_> = (0..31)
            .map(|offset| {
                let timestamp =
                    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::days(offset);
                entry(service_id, ProbeStatus::Up, Some(5), timestamp)
            })
            .collect();

        let buckets = daily_buckets(&entries);
        assert_eq!(buckets.len(), MAX_DAILY_BUCKETS);
        assert_eq!(
            buckets.first().unwrap().date,
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
        assert_eq!(
            buckets.last().unwrap().date,
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
        assert!(buckets.windows(2).all(|pair| pair[0].date < pair[1].date));
    }

    mod store_backed {
        use super::*;
        use url::Url;
        use vigil_store::{ServiceStore, StatusLogStore};
        use vigil_store_memory::{MemoryServiceStore, MemoryStatusLogStore};
        use vigil_types::Service;

        #[tokio::test]
        async fn empty_window_reports_no_data() {
            let services = MemoryServiceStore::new();
            let logs = MemoryStatusLogStore::new();
            let service = Service::new("api", Url::parse("https://api.example.com").unwrap());
            let service_id = service.id;
            services.create(service).await.unwrap();

            let analyzer = Analyzer::new(services, logs);
            assert!(matches!(
                analyzer.compute(service_id, 7).await.unwrap(),
                AnalyticsReport::NoData
            ));
        }

        #[tokio::test]
        async fn unknown_service_and_zero_window_are_rejected() {
            let analyzer = Analyzer::new(MemoryServiceStore::new(), MemoryStatusLogStore::new());

            assert!(matches!(
                analyzer.compute(Uuid::new_v4(), 7).await,
                Err(Error::UnknownService(_))
            ));
            assert!(matches!(
                analyzer.compute(Uuid::new_v4(), 0).await,
                Err(Error::InvalidWindow(0))
            ));
        }

        #[tokio::test]
        async fn window_excludes_older_entries() {
            let services = MemoryServiceStore::new();
            let logs = MemoryStatusLogStore::new();
            let service = Service::new("api", Url::parse("https://api.example.com").unwrap());
            let service_id = service.id;
            services.create(service).await.unwrap();

            // One entry inside the 7-day window, one outside.
            logs.append(StatusLogEntry::new(
                service_id,
                ProbeStatus::Up,
                Some(8),
                Utc::now() - Duration::days(2),
            ))
            .await
            .unwrap();
            logs.append(StatusLogEntry::new(
                service_id,
                ProbeStatus::Down,
                None,
                Utc::now() - Duration::days(9),
            ))
            .await
            .unwrap();

            let analyzer = Analyzer::new(services, logs);
            match analyzer.compute(service_id, 7).await.unwrap() {
                AnalyticsReport::Data(analytics) => {
                    assert_eq!(analytics.total_checks, 1);
                    assert_eq!(analytics.down_count, 0);
                }
                AnalyticsReport::NoData => panic!("expected data"),
            }
        }
    }
}
