// Workload Lifecycle Library - claim/heartbeat bookkeeping for distributed workers
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod database;
pub mod telemetry;
pub mod workload;

// Re-export key types for easy access
pub use config::{config, init_config, WorkloadLifecycleConfig};
#[cfg(feature = "database")]
pub use database::DatabaseManager;
pub use telemetry::{create_lifecycle_span, generate_correlation_id, init_telemetry};
pub use workload::{
    ExternalWorkloadStatus, InMemoryWorkloadStore, LifecycleEvent, StoreError, UpdateOutcome,
    Workload, WorkloadError, WorkloadFilter, WorkloadLabel, WorkloadLifecycleManager,
    WorkloadStatus, WorkloadStore,
};
#[cfg(feature = "database")]
pub use workload::SqliteWorkloadStore;
