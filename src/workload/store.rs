//! Storage façade for workload records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::error::StoreError;
use super::status::WorkloadStatus;
use super::types::{UpdateOutcome, Workload, WorkloadFilter};

/// Persistence contract consumed by the lifecycle manager.
///
/// Implementations own no business rules, but they are responsible for
/// atomicity:
/// - `update_status_and_dataplane` and `update_status_and_heartbeat` must
///   compare and write in one indivisible step, returning
///   [`UpdateOutcome::Stale`] without writing when the expectation fails.
/// - `search` must treat a supplied empty list as "match nothing".
/// - every successful write refreshes `updated_at`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    async fn exists(&self, id: &str) -> Result<bool, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Workload>, StoreError>;

    /// Persist a new record, assigning `created_at`/`updated_at`.
    async fn insert(&self, workload: Workload) -> Result<Workload, StoreError>;

    async fn search(&self, filter: &WorkloadFilter) -> Result<Vec<Workload>, StoreError>;

    /// Unconditional status overwrite.
    async fn update_status(&self, id: &str, status: WorkloadStatus) -> Result<(), StoreError>;

    /// Write `status` and `dataplane_id` if the record is still `expected`
    /// and not owned by a different dataplane.
    async fn update_status_and_dataplane(
        &self,
        id: &str,
        expected: WorkloadStatus,
        status: WorkloadStatus,
        dataplane_id: &str,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Write `status` and `last_heartbeat_at` if the record is still `expected`.
    async fn update_status_and_heartbeat(
        &self,
        id: &str,
        expected: WorkloadStatus,
        status: WorkloadStatus,
        heartbeat_at: DateTime<Utc>,
    ) -> Result<UpdateOutcome, StoreError>;
}
