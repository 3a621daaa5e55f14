//! Guarded workload lifecycle: creation, claim race, heartbeats.
//!
//! The manager is stateless apart from a store handle and immutable tuning.
//! Every mutation is one read followed by one conditional write; when the
//! write reports [`UpdateOutcome::Stale`] the record is re-read and the rules
//! are evaluated again against the fresh state. No locks are taken here, so
//! any number of managers may run against the same store.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

use crate::config::LifecycleConfig;
use crate::telemetry::{create_lifecycle_span, generate_correlation_id};

use super::error::WorkloadError;
use super::status::{LifecycleEvent, WorkloadStatus};
use super::store::WorkloadStore;
use super::types::{UpdateOutcome, Workload, WorkloadFilter, WorkloadLabel};

#[derive(Clone)]
pub struct WorkloadLifecycleManager {
    store: Arc<dyn WorkloadStore>,
    config: LifecycleConfig,
}

impl std::fmt::Debug for WorkloadLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadLifecycleManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorkloadLifecycleManager {
    pub fn new(store: Arc<dyn WorkloadStore>, config: LifecycleConfig) -> Self {
        Self { store, config }
    }

    /// Manager with default tuning over `store`.
    pub fn with_store<S: WorkloadStore + 'static>(store: S) -> Self {
        Self::new(Arc::new(store), LifecycleConfig::default())
    }

    /// Create a pending, unclaimed workload.
    ///
    /// Fails with [`WorkloadError::Conflict`] when `id` is already taken; the
    /// existing record is left untouched.
    pub async fn create_workload(
        &self,
        id: &str,
        labels: Vec<WorkloadLabel>,
    ) -> Result<Workload, WorkloadError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span("create_workload", Some(id), None, Some(&correlation_id));

        async move {
            if self.store.exists(id).await? {
                info!(workload_id = %id, "Workload already exists, nothing modified");
                return Err(WorkloadError::Conflict { id: id.to_string() });
            }

            let workload = self.store.insert(Workload::pending(id, labels)).await?;
            info!(
                workload_id = %workload.id,
                labels = workload.labels.len(),
                "Workload created"
            );
            Ok(workload)
        }
        .instrument(span)
        .await
    }

    pub async fn get_workload(&self, id: &str) -> Result<Workload, WorkloadError> {
        self.load(id).await
    }

    /// List workloads matching every supplied filter.
    ///
    /// An empty `dataplane_ids` or `statuses` list matches nothing and the
    /// store is not queried. `None` leaves that field unfiltered.
    pub async fn get_workloads(
        &self,
        dataplane_ids: Option<Vec<String>>,
        statuses: Option<Vec<WorkloadStatus>>,
        updated_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<Workload>, WorkloadError> {
        self.search_workloads(&WorkloadFilter {
            dataplane_ids,
            statuses,
            updated_before,
        })
        .await
    }

    pub async fn search_workloads(
        &self,
        filter: &WorkloadFilter,
    ) -> Result<Vec<Workload>, WorkloadError> {
        if filter.matches_nothing() {
            debug!(?filter, "Empty list filter, skipping store query");
            return Ok(Vec::new());
        }
        Ok(self.store.search(filter).await?)
    }

    /// Administrative status override.
    ///
    /// Bypasses the transition table entirely; this is the only path to
    /// `success`, `failure` and `cancelled`. Callers are trusted.
    pub async fn update_workload(
        &self,
        id: &str,
        status: WorkloadStatus,
    ) -> Result<(), WorkloadError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span("update_workload", Some(id), None, Some(&correlation_id));

        async move {
            self.store.update_status(id, status).await?;
            info!(workload_id = %id, status = %status, "Workload status overridden");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Record a liveness signal from the owning dataplane.
    ///
    /// Legal only from `claimed` or `running`; moves the workload to
    /// `running` and stamps `last_heartbeat_at`.
    pub async fn heartbeat(&self, id: &str) -> Result<(), WorkloadError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span("heartbeat", Some(id), None, Some(&correlation_id));

        async move {
            for attempt in 1..=self.max_attempts() {
                let workload = self.load(id).await?;
                let target = self.guard(&workload, LifecycleEvent::Heartbeat)?;
                let now = Utc::now();

                match self
                    .store
                    .update_status_and_heartbeat(id, workload.status, target, now)
                    .await?
                {
                    UpdateOutcome::Applied => {
                        debug!(
                            workload_id = %id,
                            dataplane_id = ?workload.dataplane_id,
                            from = %workload.status,
                            "Heartbeat recorded"
                        );
                        return Ok(());
                    }
                    UpdateOutcome::Stale => {
                        debug!(workload_id = %id, attempt, "Heartbeat raced a concurrent update, re-reading");
                    }
                }
            }
            Err(self.exhausted(id))
        }
        .instrument(span)
        .await
    }

    /// Try to take ownership of a pending workload.
    ///
    /// Returns `Ok(false)` when another dataplane already owns it, which is
    /// the ordinary outcome of losing a race. Claiming anything that is not
    /// `pending` and not owned by someone else, including a workload this
    /// dataplane already claimed, is an invalid transition.
    pub async fn claim_workload(&self, id: &str, dataplane_id: &str) -> Result<bool, WorkloadError> {
        let correlation_id = generate_correlation_id();
        let span = create_lifecycle_span(
            "claim_workload",
            Some(id),
            Some(dataplane_id),
            Some(&correlation_id),
        );

        async move {
            for attempt in 1..=self.max_attempts() {
                let workload = self.load(id).await?;

                if workload.is_claimed() && !workload.is_owned_by(dataplane_id) {
                    debug!(
                        workload_id = %id,
                        owner = ?workload.dataplane_id,
                        "Workload already claimed by another dataplane"
                    );
                    return Ok(false);
                }

                let target = self.guard(&workload, LifecycleEvent::Claim)?;

                match self
                    .store
                    .update_status_and_dataplane(id, workload.status, target, dataplane_id)
                    .await?
                {
                    UpdateOutcome::Applied => {
                        info!(workload_id = %id, dataplane_id = %dataplane_id, "Workload claimed");
                        return Ok(true);
                    }
                    UpdateOutcome::Stale => {
                        debug!(workload_id = %id, attempt, "Claim raced a concurrent update, re-reading");
                    }
                }
            }
            Err(self.exhausted(id))
        }
        .instrument(span)
        .await
    }

    async fn load(&self, id: &str) -> Result<Workload, WorkloadError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| WorkloadError::NotFound { id: id.to_string() })
    }

    fn guard(
        &self,
        workload: &Workload,
        event: LifecycleEvent,
    ) -> Result<WorkloadStatus, WorkloadError> {
        workload.status.transition(event).ok_or_else(|| {
            warn!(
                workload_id = %workload.id,
                status = %workload.status,
                operation = %event,
                "Rejected invalid status transition"
            );
            WorkloadError::InvalidStatusTransition {
                id: workload.id.clone(),
                status: workload.status,
                operation: event,
            }
        })
    }

    fn max_attempts(&self) -> u32 {
        self.config.max_conditional_retries.saturating_add(1)
    }

    fn exhausted(&self, id: &str) -> WorkloadError {
        let attempts = self.max_attempts();
        warn!(workload_id = %id, attempts, "Conditional update kept losing, giving up");
        WorkloadError::ContentionExhausted {
            id: id.to_string(),
            attempts,
        }
    }
}
