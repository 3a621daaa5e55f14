// In-memory WorkloadStore for tests and embedded use

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::status::WorkloadStatus;
use super::store::WorkloadStore;
use super::types::{UpdateOutcome, Workload, WorkloadFilter};

/// Every compare-and-write happens under the table's write lock, so
/// conditional updates are atomic across tasks. Clones share the table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkloadStore {
    workloads: Arc<RwLock<HashMap<String, Workload>>>,
}

impl InMemoryWorkloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.workloads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workloads.read().await.is_empty()
    }
}

#[async_trait]
impl WorkloadStore for InMemoryWorkloadStore {
    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.workloads.read().await.contains_key(id))
    }

    async fn get(&self, id: &str) -> Result<Option<Workload>, StoreError> {
        Ok(self.workloads.read().await.get(id).cloned())
    }

    async fn insert(&self, mut workload: Workload) -> Result<Workload, StoreError> {
        let mut workloads = self.workloads.write().await;
        if workloads.contains_key(&workload.id) {
            return Err(StoreError::Conflict(workload.id));
        }
        let now = Utc::now();
        workload.created_at = now;
        workload.updated_at = now;
        workloads.insert(workload.id.clone(), workload.clone());
        Ok(workload)
    }

    async fn search(&self, filter: &WorkloadFilter) -> Result<Vec<Workload>, StoreError> {
        if filter.matches_nothing() {
            return Ok(Vec::new());
        }
        let mut found: Vec<Workload> = self
            .workloads
            .read()
            .await
            .values()
            .filter(|workload| filter.matches(workload))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn update_status(&self, id: &str, status: WorkloadStatus) -> Result<(), StoreError> {
        let mut workloads = self.workloads.write().await;
        let workload = workloads
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        workload.status = status;
        workload.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status_and_dataplane(
        &self,
        id: &str,
        expected: WorkloadStatus,
        status: WorkloadStatus,
        dataplane_id: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut workloads = self.workloads.write().await;
        let workload = workloads
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let owner_ok = workload
            .dataplane_id
            .as_deref()
            .map_or(true, |owner| owner == dataplane_id);
        if workload.status != expected || !owner_ok {
            return Ok(UpdateOutcome::Stale);
        }

        workload.status = status;
        workload.dataplane_id = Some(dataplane_id.to_string());
        workload.updated_at = Utc::now();
        Ok(UpdateOutcome::Applied)
    }

    async fn update_status_and_heartbeat(
        &self,
        id: &str,
        expected: WorkloadStatus,
        status: WorkloadStatus,
        heartbeat_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut workloads = self.workloads.write().await;
        let workload = workloads
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if workload.status != expected {
            return Ok(UpdateOutcome::Stale);
        }

        workload.status = status;
        workload.last_heartbeat_at = Some(heartbeat_at);
        workload.updated_at = Utc::now();
        Ok(UpdateOutcome::Applied)
    }
}
