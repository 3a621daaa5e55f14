// Workload Lifecycle Module
//
// Records, the storage contract, and the guarded state machine that sits on
// top of it. The manager only depends on the store's conditional-update
// contract, never on how a particular store achieves atomicity.

pub mod error;
pub mod manager;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;
pub mod status;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod tests;

pub use error::{StoreError, WorkloadError};
pub use manager::WorkloadLifecycleManager;
pub use memory::InMemoryWorkloadStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteWorkloadStore;
pub use status::{ExternalWorkloadStatus, LifecycleEvent, ParseStatusError, WorkloadStatus};
pub use store::WorkloadStore;
pub use types::{UpdateOutcome, Workload, WorkloadFilter, WorkloadLabel};
