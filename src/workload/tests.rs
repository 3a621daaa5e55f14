// Tests for the lifecycle manager against a scripted store

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::Sequence;

    use super::super::error::{StoreError, WorkloadError};
    use super::super::manager::WorkloadLifecycleManager;
    use super::super::status::{LifecycleEvent, WorkloadStatus};
    use super::super::store::MockWorkloadStore;
    use super::super::types::{UpdateOutcome, Workload, WorkloadFilter, WorkloadLabel};
    use crate::config::LifecycleConfig;

    fn workload(status: WorkloadStatus, dataplane_id: Option<&str>) -> Workload {
        let mut workload = Workload::pending("w1", Vec::new());
        workload.status = status;
        workload.dataplane_id = dataplane_id.map(str::to_string);
        workload
    }

    fn manager(store: MockWorkloadStore, retries: u32) -> WorkloadLifecycleManager {
        WorkloadLifecycleManager::new(
            Arc::new(store),
            LifecycleConfig {
                max_conditional_retries: retries,
            },
        )
    }

    #[tokio::test]
    async fn test_lost_claim_cas_rereads_and_reports_false() {
        let mut store = MockWorkloadStore::new();
        let mut seq = Sequence::new();

        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Pending, None))));
        store
            .expect_update_status_and_dataplane()
            .withf(|id, expected, status, dataplane| {
                id == "w1"
                    && *expected == WorkloadStatus::Pending
                    && *status == WorkloadStatus::Claimed
                    && dataplane == "d1"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(UpdateOutcome::Stale));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Claimed, Some("d2")))));

        let claimed = manager(store, 3).claim_workload("w1", "d1").await.unwrap();
        assert!(!claimed);
    }

    #[tokio::test]
    async fn test_claim_gives_up_after_retry_budget() {
        let mut store = MockWorkloadStore::new();
        store
            .expect_get()
            .times(3)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Pending, None))));
        store
            .expect_update_status_and_dataplane()
            .times(3)
            .returning(|_, _, _, _| Ok(UpdateOutcome::Stale));

        let err = manager(store, 2).claim_workload("w1", "d1").await.unwrap_err();
        assert!(matches!(
            err,
            WorkloadError::ContentionExhausted { ref id, attempts: 3 } if id == "w1"
        ));
    }

    #[tokio::test]
    async fn test_claim_of_non_pending_never_writes() {
        let mut store = MockWorkloadStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(workload(WorkloadStatus::Running, Some("d1")))));
        store.expect_update_status_and_dataplane().never();

        let err = manager(store, 3).claim_workload("w1", "d1").await.unwrap_err();
        assert!(matches!(
            err,
            WorkloadError::InvalidStatusTransition {
                status: WorkloadStatus::Running,
                operation: LifecycleEvent::Claim,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_claim_owned_elsewhere_is_false_without_writing() {
        let mut store = MockWorkloadStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Running, Some("d2")))));
        store.expect_update_status_and_dataplane().never();

        let claimed = manager(store, 3).claim_workload("w1", "d1").await.unwrap();
        assert!(!claimed);
    }

    #[tokio::test]
    async fn test_heartbeat_retry_uses_freshly_observed_status() {
        let mut store = MockWorkloadStore::new();
        let mut seq = Sequence::new();

        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Claimed, Some("d1")))));
        store
            .expect_update_status_and_heartbeat()
            .withf(|_, expected, status, _| {
                *expected == WorkloadStatus::Claimed && *status == WorkloadStatus::Running
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(UpdateOutcome::Stale));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Running, Some("d1")))));
        store
            .expect_update_status_and_heartbeat()
            .withf(|_, expected, status, _| {
                *expected == WorkloadStatus::Running && *status == WorkloadStatus::Running
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(UpdateOutcome::Applied));

        manager(store, 3).heartbeat("w1").await.unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_stops_when_workload_finishes_mid_race() {
        let mut store = MockWorkloadStore::new();
        let mut seq = Sequence::new();

        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Running, Some("d1")))));
        store
            .expect_update_status_and_heartbeat()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(UpdateOutcome::Stale));
        store
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Some(workload(WorkloadStatus::Cancelled, Some("d1")))));

        let err = manager(store, 3).heartbeat("w1").await.unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[tokio::test]
    async fn test_empty_list_filters_never_reach_the_store() {
        let mut store = MockWorkloadStore::new();
        store.expect_search().never();
        let manager = manager(store, 3);

        let by_dataplane = manager
            .get_workloads(Some(Vec::new()), Some(vec![WorkloadStatus::Pending]), None)
            .await
            .unwrap();
        let by_status = manager
            .get_workloads(Some(vec!["d1".to_string()]), Some(Vec::new()), None)
            .await
            .unwrap();
        assert!(by_dataplane.is_empty());
        assert!(by_status.is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_search_is_delegated() {
        let mut store = MockWorkloadStore::new();
        store
            .expect_search()
            .withf(|filter| *filter == WorkloadFilter::default())
            .times(1)
            .returning(|_| Ok(vec![workload(WorkloadStatus::Pending, None)]));

        let found = manager(store, 3).get_workloads(None, None, None).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_create_checks_existence_before_inserting() {
        let mut store = MockWorkloadStore::new();
        store.expect_exists().returning(|_| Ok(true));
        store.expect_insert().never();

        let err = manager(store, 3)
            .create_workload("w1", vec![WorkloadLabel::new("k", "v")])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_create_maps_racing_insert_to_conflict() {
        let mut store = MockWorkloadStore::new();
        store.expect_exists().returning(|_| Ok(false));
        store
            .expect_insert()
            .returning(|workload| Err(StoreError::Conflict(workload.id)));

        let err = manager(store, 3).create_workload("w1", Vec::new()).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_of_missing_workload_is_not_found() {
        let mut store = MockWorkloadStore::new();
        store
            .expect_update_status()
            .returning(|id, _| Err(StoreError::NotFound(id.to_string())));

        let err = manager(store, 3)
            .update_workload("missing", WorkloadStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_store_failures_are_wrapped_not_retried() {
        let mut store = MockWorkloadStore::new();
        store.expect_get().times(1).returning(|id| {
            Err(StoreError::Corrupt {
                id: id.to_string(),
                reason: "unreadable".to_string(),
            })
        });

        let err = manager(store, 3).heartbeat("w1").await.unwrap_err();
        assert!(matches!(err, WorkloadError::Store(StoreError::Corrupt { .. })));
    }
}
