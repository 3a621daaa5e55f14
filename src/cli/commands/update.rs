use anyhow::Result;
use serde_json::json;

use super::{print_json, Command};
use crate::workload::{ExternalWorkloadStatus, WorkloadLifecycleManager};

pub struct UpdateCommand {
    pub id: String,
    pub status: ExternalWorkloadStatus,
}

impl Command for UpdateCommand {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()> {
        manager.update_workload(&self.id, self.status.into()).await?;
        print_json(&json!({ "id": self.id, "status": self.status }))
    }
}
