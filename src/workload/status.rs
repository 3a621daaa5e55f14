// Workload status vocabularies and the guarded transition table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status as persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    /// Created, waiting for a dataplane to claim it
    Pending,
    /// Owned by a dataplane, no heartbeat received yet
    Claimed,
    /// Owned by a dataplane that is heartbeating
    Running,
    Success,
    Failure,
    Cancelled,
}

/// Events the guarded state machine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Claim,
    Heartbeat,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Claim => "claim",
            LifecycleEvent::Heartbeat => "heartbeat",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workload status: {value:?}")]
pub struct ParseStatusError {
    pub value: String,
}

impl WorkloadStatus {
    pub const ALL: [WorkloadStatus; 6] = [
        WorkloadStatus::Pending,
        WorkloadStatus::Claimed,
        WorkloadStatus::Running,
        WorkloadStatus::Success,
        WorkloadStatus::Failure,
        WorkloadStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadStatus::Pending => "pending",
            WorkloadStatus::Claimed => "claimed",
            WorkloadStatus::Running => "running",
            WorkloadStatus::Success => "success",
            WorkloadStatus::Failure => "failure",
            WorkloadStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkloadStatus::Success | WorkloadStatus::Failure | WorkloadStatus::Cancelled
        )
    }

    /// Target status for `event`, or `None` when the transition is illegal.
    ///
    /// Only claim and heartbeat are guarded. Terminal statuses are written
    /// through the administrative override and never appear as a target here.
    pub fn transition(self, event: LifecycleEvent) -> Option<WorkloadStatus> {
        match (self, event) {
            (WorkloadStatus::Pending, LifecycleEvent::Claim) => Some(WorkloadStatus::Claimed),
            (WorkloadStatus::Claimed | WorkloadStatus::Running, LifecycleEvent::Heartbeat) => {
                Some(WorkloadStatus::Running)
            }
            _ => None,
        }
    }
}

impl fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                value: s.to_string(),
            })
    }
}

/// Status names exposed to callers outside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalWorkloadStatus {
    Pending,
    Claimed,
    Running,
    Success,
    Failure,
    Cancelled,
}

/// Lookup table for parsing external names; the `From` impls below are the
/// exhaustive conversions and the tests keep the two in agreement.
const STATUS_MAPPING: [(ExternalWorkloadStatus, &str, WorkloadStatus); 6] = [
    (ExternalWorkloadStatus::Pending, "PENDING", WorkloadStatus::Pending),
    (ExternalWorkloadStatus::Claimed, "CLAIMED", WorkloadStatus::Claimed),
    (ExternalWorkloadStatus::Running, "RUNNING", WorkloadStatus::Running),
    (ExternalWorkloadStatus::Success, "SUCCESS", WorkloadStatus::Success),
    (ExternalWorkloadStatus::Failure, "FAILURE", WorkloadStatus::Failure),
    (ExternalWorkloadStatus::Cancelled, "CANCELLED", WorkloadStatus::Cancelled),
];

impl ExternalWorkloadStatus {
    pub const ALL: [ExternalWorkloadStatus; 6] = [
        ExternalWorkloadStatus::Pending,
        ExternalWorkloadStatus::Claimed,
        ExternalWorkloadStatus::Running,
        ExternalWorkloadStatus::Success,
        ExternalWorkloadStatus::Failure,
        ExternalWorkloadStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalWorkloadStatus::Pending => "PENDING",
            ExternalWorkloadStatus::Claimed => "CLAIMED",
            ExternalWorkloadStatus::Running => "RUNNING",
            ExternalWorkloadStatus::Success => "SUCCESS",
            ExternalWorkloadStatus::Failure => "FAILURE",
            ExternalWorkloadStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ExternalWorkloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; anything outside the six known names, including names
/// padded with whitespace, is rejected.
impl FromStr for ExternalWorkloadStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_uppercase();
        STATUS_MAPPING
            .iter()
            .find(|(_, name, _)| *name == wanted)
            .map(|(external, _, _)| *external)
            .ok_or_else(|| ParseStatusError {
                value: s.to_string(),
            })
    }
}

impl From<ExternalWorkloadStatus> for WorkloadStatus {
    fn from(external: ExternalWorkloadStatus) -> Self {
        match external {
            ExternalWorkloadStatus::Pending => WorkloadStatus::Pending,
            ExternalWorkloadStatus::Claimed => WorkloadStatus::Claimed,
            ExternalWorkloadStatus::Running => WorkloadStatus::Running,
            ExternalWorkloadStatus::Success => WorkloadStatus::Success,
            ExternalWorkloadStatus::Failure => WorkloadStatus::Failure,
            ExternalWorkloadStatus::Cancelled => WorkloadStatus::Cancelled,
        }
    }
}

impl From<WorkloadStatus> for ExternalWorkloadStatus {
    fn from(status: WorkloadStatus) -> Self {
        match status {
            WorkloadStatus::Pending => ExternalWorkloadStatus::Pending,
            WorkloadStatus::Claimed => ExternalWorkloadStatus::Claimed,
            WorkloadStatus::Running => ExternalWorkloadStatus::Running,
            WorkloadStatus::Success => ExternalWorkloadStatus::Success,
            WorkloadStatus::Failure => ExternalWorkloadStatus::Failure,
            WorkloadStatus::Cancelled => ExternalWorkloadStatus::Cancelled,
        }
    }
}
