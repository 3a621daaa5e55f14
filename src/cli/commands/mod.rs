use anyhow::Result;
use serde_json::{json, Value};

use super::Commands;
use crate::config::{StoreBackend, WorkloadLifecycleConfig};
use crate::workload::{
    ExternalWorkloadStatus, InMemoryWorkloadStore, Workload, WorkloadLifecycleManager,
};

pub mod claim;
pub mod create;
pub mod heartbeat;
pub mod list;
pub mod show;
pub mod update;

pub use claim::ClaimCommand;
pub use create::CreateCommand;
pub use heartbeat::HeartbeatCommand;
pub use list::ListCommand;
pub use show::ShowCommand;
pub use update::UpdateCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()>;
}

/// Build a manager over the configured store backend.
pub async fn open_manager(config: &WorkloadLifecycleConfig) -> Result<WorkloadLifecycleManager> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; workloads are discarded on exit");
            Ok(WorkloadLifecycleManager::new(
                std::sync::Arc::new(InMemoryWorkloadStore::new()),
                config.lifecycle.clone(),
            ))
        }
        #[cfg(feature = "database")]
        StoreBackend::Sqlite => {
            let database = crate::database::DatabaseManager::from_config(&config.store).await?;
            Ok(WorkloadLifecycleManager::new(
                std::sync::Arc::new(crate::workload::SqliteWorkloadStore::new(&database)),
                config.lifecycle.clone(),
            ))
        }
        #[cfg(not(feature = "database"))]
        StoreBackend::Sqlite => {
            anyhow::bail!("sqlite store requested but this build lacks the `database` feature")
        }
    }
}

/// Execute one parsed subcommand against `manager`.
pub async fn run(command: Commands, manager: &WorkloadLifecycleManager) -> Result<()> {
    match command {
        Commands::Create { id, labels } => CreateCommand::new(id, labels).execute(manager).await,
        Commands::Get { id } => ShowCommand { id }.execute(manager).await,
        Commands::List {
            dataplanes,
            statuses,
            updated_before,
        } => {
            ListCommand {
                dataplanes,
                statuses,
                updated_before,
            }
            .execute(manager)
            .await
        }
        Commands::Update { id, status } => UpdateCommand { id, status }.execute(manager).await,
        Commands::Heartbeat { id } => HeartbeatCommand { id }.execute(manager).await,
        Commands::Claim { id, dataplane_id } => {
            ClaimCommand::new(id, dataplane_id)?.execute(manager).await
        }
    }
}

/// JSON view of a workload using the external status vocabulary.
pub fn workload_json(workload: &Workload) -> Value {
    json!({
        "id": workload.id,
        "dataplaneId": workload.dataplane_id,
        "status": ExternalWorkloadStatus::from(workload.status),
        "createdAt": workload.created_at.to_rfc3339(),
        "updatedAt": workload.updated_at.to_rfc3339(),
        "lastHeartbeatAt": workload.last_heartbeat_at.map(|at| at.to_rfc3339()),
        "labels": workload.labels,
    })
}

pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
