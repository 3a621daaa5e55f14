// Core records tracked by the workload lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::WorkloadStatus;

/// Opaque key/value metadata attached when a workload is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadLabel {
    pub key: String,
    pub value: String,
}

impl WorkloadLabel {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A trackable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    /// Dataplane that won the claim; never cleared once set
    pub dataplane_id: Option<String>,
    pub status: WorkloadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub labels: Vec<WorkloadLabel>,
}

impl Workload {
    /// Fresh unclaimed record. The store overwrites both timestamps on insert.
    pub fn pending(id: impl Into<String>, labels: Vec<WorkloadLabel>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            dataplane_id: None,
            status: WorkloadStatus::Pending,
            created_at: now,
            updated_at: now,
            last_heartbeat_at: None,
            labels,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.dataplane_id.is_some()
    }

    pub fn is_owned_by(&self, dataplane_id: &str) -> bool {
        self.dataplane_id.as_deref() == Some(dataplane_id)
    }
}

/// Search criteria, combined with AND.
///
/// `None` leaves a field unfiltered. `Some(vec![])` matches nothing, so a
/// caller that builds an empty list never gets the whole table back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadFilter {
    pub dataplane_ids: Option<Vec<String>>,
    pub statuses: Option<Vec<WorkloadStatus>>,
    pub updated_before: Option<DateTime<Utc>>,
}

impl WorkloadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataplane_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dataplane_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = WorkloadStatus>) -> Self {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn updated_before(mut self, cutoff: DateTime<Utc>) -> Self {
        self.updated_before = Some(cutoff);
        self
    }

    /// True when a list filter was supplied empty.
    pub fn matches_nothing(&self) -> bool {
        self.dataplane_ids.as_ref().is_some_and(Vec::is_empty)
            || self.statuses.as_ref().is_some_and(Vec::is_empty)
    }

    pub fn matches(&self, workload: &Workload) -> bool {
        if let Some(ids) = &self.dataplane_ids {
            match &workload.dataplane_id {
                Some(id) if ids.contains(id) => {}
                _ => return false,
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&workload.status) {
                return false;
            }
        }
        if let Some(cutoff) = self.updated_before {
            if workload.updated_at >= cutoff {
                return false;
            }
        }
        true
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The expected state no longer held; nothing was written
    Stale,
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claimed_by(dataplane: &str) -> Workload {
        let mut workload = Workload::pending("w1", Vec::new());
        workload.dataplane_id = Some(dataplane.to_string());
        workload.status = WorkloadStatus::Claimed;
        workload
    }

    #[test]
    fn test_pending_record_has_no_owner() {
        let workload = Workload::pending("w1", vec![WorkloadLabel::new("k1", "v1")]);
        assert_eq!(workload.status, WorkloadStatus::Pending);
        assert!(!workload.is_claimed());
        assert_eq!(workload.last_heartbeat_at, None);
        assert_eq!(workload.labels, vec![WorkloadLabel::new("k1", "v1")]);
    }

    #[test]
    fn test_ownership_is_exact_dataplane_match() {
        let workload = claimed_by("d1");
        assert!(workload.is_claimed());
        assert!(workload.is_owned_by("d1"));
        assert!(!workload.is_owned_by("d2"));
        assert!(!workload.is_owned_by("D1"));
        assert!(!Workload::pending("w2", Vec::new()).is_owned_by("d1"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = WorkloadFilter::new();
        assert!(!filter.matches_nothing());
        assert!(filter.matches(&Workload::pending("w1", Vec::new())));
    }

    #[test]
    fn test_empty_lists_match_nothing() {
        assert!(WorkloadFilter::new()
            .with_dataplane_ids(Vec::<String>::new())
            .matches_nothing());
        assert!(WorkloadFilter::new().with_statuses([]).matches_nothing());
    }

    #[test]
    fn test_dataplane_filter_excludes_unclaimed() {
        let filter = WorkloadFilter::new().with_dataplane_ids(["d1"]);
        assert!(!filter.matches(&Workload::pending("w1", Vec::new())));
        assert!(filter.matches(&claimed_by("d1")));
        assert!(!filter.matches(&claimed_by("d2")));
    }

    #[test]
    fn test_updated_before_is_strict() {
        let workload = claimed_by("d1");
        let at = workload.updated_at;
        assert!(!WorkloadFilter::new().updated_before(at).matches(&workload));
        assert!(WorkloadFilter::new()
            .updated_before(at + Duration::milliseconds(1))
            .matches(&workload));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filter = WorkloadFilter::new()
            .with_dataplane_ids(["d1"])
            .with_statuses([WorkloadStatus::Running]);
        assert!(!filter.matches(&claimed_by("d1")));
    }
}
