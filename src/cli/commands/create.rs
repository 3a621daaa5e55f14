use anyhow::Result;

use super::{print_json, workload_json, Command};
use crate::workload::{WorkloadLabel, WorkloadLifecycleManager};

pub struct CreateCommand {
    pub id: String,
    pub labels: Vec<WorkloadLabel>,
}

impl CreateCommand {
    pub fn new(id: impl Into<String>, labels: Vec<WorkloadLabel>) -> Self {
        Self {
            id: id.into(),
            labels,
        }
    }
}

impl Command for CreateCommand {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()> {
        let workload = manager
            .create_workload(&self.id, self.labels.clone())
            .await?;
        print_json(&workload_json(&workload))
    }
}
