//! In-memory (single node) implementations of the vigil storage traits,
//! for local development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_store::{
    IncidentStore, ServiceStore, StatusLogStore, StoreError, StoreResult,
};
use vigil_types::{Incident, ProbeStatus, Service, ServiceStatus, StatusLogEntry};

/// In-memory service registry.
#[derive(Clone, Debug, Default)]
pub struct MemoryServiceStore {
    services: Arc<RwLock<HashMap<Uuid, Service>>>,
}

impl MemoryServiceStore {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceStore for MemoryServiceStore {
    async fn create(&self, service: Service) -> StoreResult<()> {
        self.services.write().await.insert(service.id, service);
        Ok(())
    }

    async fn get(&self, service_id: Uuid) -> StoreResult<Option<Service>> {
        Ok(self.services.read().await.get(&service_id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Service>> {
        Ok(self.services.read().await.values().cloned().collect())
    }

    async fn update(&self, service: Service) -> StoreResult<()> {
        let mut services = self.services.write().await;
        match services.get_mut(&service.id) {
            Some(existing) => {
                *existing = service;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("service {}", service.id))),
        }
    }

    async fn apply_probe(
        &self,
        service_id: Uuid,
        status: ServiceStatus,
        latency_ms: Option<u64>,
        uptime: f64,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut services = self.services.write().await;
        let service = services
            .get_mut(&service_id)
            .ok_or_else(|| StoreError::NotFound(format!("service {service_id}")))?;

        service.status = status;
        service.latency_ms = latency_ms;
        service.uptime = uptime;
        service.last_checked = Some(checked_at);

        Ok(())
    }

    async fn delete(&self, service_id: Uuid) -> StoreResult<bool> {
        Ok(self.services.write().await.remove(&service_id).is_some())
    }
}

/// Key ordering entries by timestamp, with the entry id breaking ties so
/// two observations in the same millisecond both survive.
type LogKey = (DateTime<Utc>, Uuid);

/// In-memory append-only status log. Entries are held per service in a
/// `BTreeMap` keyed by timestamp, so range scans come back ordered even
/// when writes arrive out of order.
#[derive(Clone, Debug, Default)]
pub struct MemoryStatusLogStore {
    logs: Arc<RwLock<HashMap<Uuid, BTreeMap<LogKey, StatusLogEntry>>>>,
    by_id: Arc<RwLock<HashMap<Uuid, (Uuid, LogKey)>>>,
}

impl MemoryStatusLogStore {
    /// Creates a new empty log store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusLogStore for MemoryStatusLogStore {
    async fn append(&self, entry: StatusLogEntry) -> StoreResult<()> {
        let key = (entry.timestamp, entry.id);
        let mut by_id = self.by_id.write().await;
        let mut logs = self.logs.write().await;

        by_id.insert(entry.id, (entry.service_id, key));
        logs.entry(entry.service_id).or_default().insert(key, entry);

        Ok(())
    }

    async fn entries_in_range(
        &self,
        service_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StatusLogEntry>> {
        let logs = self.logs.read().await;

        Ok(logs.get(&service_id).map_or_else(Vec::new, |entries| {
            entries
                .range((from, Uuid::nil())..)
                .take_while(|((timestamp, _), _)| *timestamp <= to)
                .map(|(_, entry)| entry.clone())
                .collect()
        }))
    }

    async fn entries_with_status(
        &self,
        service_id: Uuid,
        status: ProbeStatus,
        from: DateTime<Utc>,
    ) -> StoreResult<Vec<StatusLogEntry>> {
        let logs = self.logs.read().await;

        Ok(logs.get(&service_id).map_or_else(Vec::new, |entries| {
            entries
                .range((from, Uuid::nil())..)
                .filter(|(_, entry)| entry.status == status)
                .map(|(_, entry)| entry.clone())
                .collect()
        }))
    }

    async fn count(&self, service_id: Uuid) -> StoreResult<u64> {
        let logs = self.logs.read().await;
        Ok(logs.get(&service_id).map_or(0, |entries| entries.len() as u64))
    }

    async fn counts(&self, service_id: Uuid) -> StoreResult<(u64, u64)> {
        // One read lock for both numbers, so they describe the same
        // snapshot of the log.
        let logs = self.logs.read().await;

        Ok(logs.get(&service_id).map_or((0, 0), |entries| {
            let up = entries
                .values()
                .filter(|entry| entry.status == ProbeStatus::Up)
                .count() as u64;
            (entries.len() as u64, up)
        }))
    }

    async fn get_many(&self, entry_ids: &[Uuid]) -> StoreResult<Vec<StatusLogEntry>> {
        let by_id = self.by_id.read().await;
        let logs = self.logs.read().await;

        Ok(entry_ids
            .iter()
            .filter_map(|entry_id| {
                let (service_id, key) = by_id.get(entry_id)?;
                logs.get(service_id)?.get(key).cloned()
            })
            .collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut by_id = self.by_id.write().await;
        let mut logs = self.logs.write().await;
        let mut deleted = 0u64;

        for entries in logs.values_mut() {
            let keep = entries.split_off(&(cutoff, Uuid::nil()));
            let removed = std::mem::replace(entries, keep);
            deleted += removed.len() as u64;

            for entry in removed.values() {
                by_id.remove(&entry.id);
            }
        }

        Ok(deleted)
    }
}

/// In-memory incident records.
#[derive(Clone, Debug, Default)]
pub struct MemoryIncidentStore {
    incidents: Arc<RwLock<HashMap<Uuid, Incident>>>,
}

impl MemoryIncidentStore {
    /// Creates a new empty incident store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for MemoryIncidentStore {
    async fn create(&self, incident: Incident) -> StoreResult<()> {
        self.incidents.write().await.insert(incident.id, incident);
        Ok(())
    }

    async fn get(&self, incident_id: Uuid) -> StoreResult<Option<Incident>> {
        Ok(self.incidents.read().await.get(&incident_id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Incident>> {
        let mut incidents: Vec<_> = self.incidents.read().await.values().cloned().collect();
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(incidents)
    }

    async fn list_for_service(&self, service_id: Uuid) -> StoreResult<Vec<Incident>> {
        let mut incidents: Vec<_> = self
            .incidents
            .read()
            .await
            .values()
            .filter(|incident| incident.service_id == service_id)
            .cloned()
            .collect();
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(incidents)
    }

    async fn update(&self, incident: Incident) -> StoreResult<()> {
        let mut incidents = self.incidents.write().await;
        match incidents.get_mut(&incident.id) {
            Some(existing) => {
                *existing = incident;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("incident {}", incident.id))),
        }
    }

    async fn delete(&self, incident_id: Uuid) -> StoreResult<bool> {
        Ok(self.incidents.write().await.remove(&incident_id).is_some())
    }

    async fn find_started_near(
        &self,
        service_id: Uuid,
        around: DateTime<Utc>,
        tolerance: Duration,
    ) -> StoreResult<Option<Incident>> {
        let incidents = self.incidents.read().await;

        Ok(incidents
            .values()
            .find(|incident| {
                incident.service_id == service_id
                    && (incident.start_time - around).abs() <= tolerance
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use url::Url;

    fn entry_at(service_id: Uuid, status: ProbeStatus, minute: u32) -> StatusLogEntry {
        let timestamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap();
        StatusLogEntry::new(service_id, status, Some(25), timestamp)
    }

    #[tokio::test]
    async fn range_scans_are_ordered_despite_insertion_order() {
        let store = MemoryStatusLogStore::new();
        let service_id = Uuid::new_v4();

        for minute in [5, 1, 3, 2, 4] {
            store
                .append(entry_at(service_id, ProbeStatus::Up, minute))
                .await
                .unwrap();
        }

        let from = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 6, 1, 12, 59, 0).unwrap();
        let entries = store.entries_in_range(service_id, from, to).await.unwrap();

        let minutes: Vec<_> = entries
            .iter()
            .map(|e| chrono::Timelike::minute(&e.timestamp))
            .collect();
        assert_eq!(minutes, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn retention_deletes_strictly_before_cutoff_and_is_idempotent() {
        let store = MemoryStatusLogStore::new();
        let service_id = Uuid::new_v4();

        for minute in 0..10 {
            store
                .append(entry_at(service_id, ProbeStatus::Up, minute))
                .await
                .unwrap();
        }

        let cutoff = Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap();
        assert_eq!(store.delete_older_than(cutoff).await.unwrap(), 5);
        assert_eq!(store.count(service_id).await.unwrap(), 5);

        // An entry exactly at the cutoff survives.
        let survivors = store
            .entries_in_range(service_id, cutoff, cutoff)
            .await
            .unwrap();
        assert_eq!(survivors.len(), 1);

        // Second run with the same cutoff deletes nothing.
        assert_eq!(store.delete_older_than(cutoff).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn counts_come_from_one_snapshot_under_concurrent_appends() {
        let store = MemoryStatusLogStore::new();
        let service_id = Uuid::new_v4();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for minute in 0..50 {
                    store
                        .append(entry_at(service_id, ProbeStatus::Up, minute))
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        // All-Up history: a torn read would show more Up entries than
        // total entries.
        for _ in 0..200 {
            let (total, up) = store.counts(service_id).await.unwrap();
            assert!(up <= total, "snapshot torn: {up} up of {total} total");
            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
        assert_eq!(store.counts(service_id).await.unwrap(), (50, 50));
    }

    #[tokio::test]
    async fn counts_separate_up_from_total() {
        let store = MemoryStatusLogStore::new();
        let service_id = Uuid::new_v4();

        for (status, minute) in [
            (ProbeStatus::Up, 0),
            (ProbeStatus::Up, 1),
            (ProbeStatus::Down, 2),
        ] {
            store.append(entry_at(service_id, status, minute)).await.unwrap();
        }

        assert_eq!(store.counts(service_id).await.unwrap(), (3, 2));
        assert_eq!(store.counts(Uuid::new_v4()).await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn get_many_drops_missing_ids() {
        let store = MemoryStatusLogStore::new();
        let service_id = Uuid::new_v4();

        let entry = entry_at(service_id, ProbeStatus::Down, 0);
        let known = entry.id;
        store.append(entry).await.unwrap();

        let found = store.get_many(&[known, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, known);
    }

    #[tokio::test]
    async fn apply_probe_only_touches_cache_fields() {
        let store = MemoryServiceStore::new();
        let service = Service::new("api", Url::parse("https://api.example.com").unwrap());
        let service_id = service.id;
        let name = service.name.clone();
        store.create(service).await.unwrap();

        store
            .apply_probe(service_id, ServiceStatus::Up, Some(12), 100.0, Utc::now())
            .await
            .unwrap();

        let service = store.get(service_id).await.unwrap().unwrap();
        assert_eq!(service.name, name);
        assert_eq!(service.status, ServiceStatus::Up);
        assert_eq!(service.latency_ms, Some(12));
    }

    #[tokio::test]
    async fn find_started_near_respects_tolerance() {
        let store = MemoryIncidentStore::new();
        let service_id = Uuid::new_v4();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        let incident = Incident::new(
            service_id,
            "Service Downtime Detected",
            "down for 6.0 minutes",
            vigil_types::IncidentSeverity::Low,
            start,
            Some(start + Duration::minutes(6)),
        );
        store.create(incident).await.unwrap();

        let tolerance = Duration::seconds(60);
        assert!(store
            .find_started_near(service_id, start + Duration::seconds(45), tolerance)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_started_near(service_id, start + Duration::seconds(90), tolerance)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_started_near(Uuid::new_v4(), start, tolerance)
            .await
            .unwrap()
            .is_none());
    }
}
