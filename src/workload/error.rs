use thiserror::Error;

use super::status::{LifecycleEvent, WorkloadStatus};

/// Failures reported by a [`super::store::WorkloadStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("workload {0} not found")]
    NotFound(String),

    #[error("workload {0} already exists")]
    Conflict(String),

    #[error("workload {id} has corrupt stored data: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("timestamp {at} is outside the storable range")]
    TimestampOutOfRange { at: chrono::DateTime<chrono::Utc> },

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Domain outcomes surfaced to callers of the lifecycle manager.
///
/// Losing a claim race is not represented here; `claim_workload` returns
/// `Ok(false)` for it.
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("workload {id} not found")]
    NotFound { id: String },

    /// Create was a no-op because the id is taken.
    #[error("workload {id} already exists, nothing was modified")]
    Conflict { id: String },

    #[error("cannot {operation} workload {id} while it is {status}")]
    InvalidStatusTransition {
        id: String,
        status: WorkloadStatus,
        operation: LifecycleEvent,
    },

    #[error("gave up on workload {id} after {attempts} conflicting updates")]
    ContentionExhausted { id: String, attempts: u32 },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for WorkloadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkloadError::NotFound { id },
            StoreError::Conflict(id) => WorkloadError::Conflict { id },
            other => WorkloadError::Store(other),
        }
    }
}

impl WorkloadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkloadError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WorkloadError::Conflict { .. })
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, WorkloadError::InvalidStatusTransition { .. })
    }
}
