// Property-based tests for the status vocabulary and list filters

use proptest::prelude::*;
use workload_lifecycle::{
    ExternalWorkloadStatus, LifecycleEvent, Workload, WorkloadFilter, WorkloadStatus,
};

fn status_strategy() -> impl Strategy<Value = WorkloadStatus> {
    proptest::sample::select(WorkloadStatus::ALL.to_vec())
}

fn dataplane_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("d1".to_string())),
        Just(Some("d2".to_string())),
        Just(Some("d3".to_string())),
    ]
}

fn workload_strategy() -> impl Strategy<Value = Workload> {
    (status_strategy(), dataplane_strategy()).prop_map(|(status, dataplane_id)| {
        let mut workload = Workload::pending("w1", Vec::new());
        workload.status = status;
        workload.dataplane_id = dataplane_id;
        workload
    })
}

proptest! {
    #[test]
    fn external_names_round_trip(status in status_strategy()) {
        let external = ExternalWorkloadStatus::from(status);
        prop_assert_eq!(WorkloadStatus::from(external), status);
        prop_assert_eq!(external.as_str().parse::<ExternalWorkloadStatus>().unwrap(), external);
        prop_assert_eq!(external.as_str().to_lowercase(), status.as_str());
    }

    #[test]
    fn unknown_external_names_are_rejected(name in "[A-Z_]{1,12}") {
        let known = ExternalWorkloadStatus::ALL.iter().any(|s| s.as_str() == name);
        prop_assert_eq!(name.parse::<ExternalWorkloadStatus>().is_ok(), known);
    }

    #[test]
    fn terminal_statuses_accept_no_guarded_event(status in status_strategy()) {
        if status.is_terminal() {
            prop_assert_eq!(status.transition(LifecycleEvent::Claim), None);
            prop_assert_eq!(status.transition(LifecycleEvent::Heartbeat), None);
        }
        if let Some(next) = status.transition(LifecycleEvent::Heartbeat) {
            prop_assert_eq!(next, WorkloadStatus::Running);
        }
    }

    #[test]
    fn empty_list_filters_match_nothing(workload in workload_strategy()) {
        let by_dataplane = WorkloadFilter::new().with_dataplane_ids(Vec::<String>::new());
        let by_status = WorkloadFilter::new().with_statuses(Vec::new());
        prop_assert!(by_dataplane.matches_nothing());
        prop_assert!(!by_dataplane.matches(&workload));
        prop_assert!(!by_status.matches(&workload));
        prop_assert!(WorkloadFilter::new().matches(&workload));
    }

    #[test]
    fn filters_combine_with_and(
        workload in workload_strategy(),
        statuses in proptest::sample::subsequence(WorkloadStatus::ALL.to_vec(), 1..=6),
        dataplanes in proptest::sample::subsequence(vec!["d1", "d2", "d3"], 1..=3),
    ) {
        let by_status = WorkloadFilter::new().with_statuses(statuses.clone());
        let by_dataplane = WorkloadFilter::new().with_dataplane_ids(dataplanes.clone());
        let both = WorkloadFilter::new()
            .with_statuses(statuses)
            .with_dataplane_ids(dataplanes);
        prop_assert_eq!(
            both.matches(&workload),
            by_status.matches(&workload) && by_dataplane.matches(&workload)
        );
    }
}
