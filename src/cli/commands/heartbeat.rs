use anyhow::Result;
use serde_json::json;

use super::{print_json, Command};
use crate::workload::WorkloadLifecycleManager;

pub struct HeartbeatCommand {
    pub id: String,
}

impl Command for HeartbeatCommand {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()> {
        manager.heartbeat(&self.id).await?;
        print_json(&json!({ "id": self.id, "heartbeat": "ok" }))
    }
}
