use anyhow::Result;

use super::{print_json, workload_json, Command};
use crate::workload::WorkloadLifecycleManager;

pub struct ShowCommand {
    pub id: String,
}

impl Command for ShowCommand {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()> {
        let workload = manager.get_workload(&self.id).await?;
        print_json(&workload_json(&workload))
    }
}
