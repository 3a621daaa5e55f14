use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{print_json, workload_json, Command};
use crate::workload::{ExternalWorkloadStatus, WorkloadLifecycleManager, WorkloadStatus};

pub struct ListCommand {
    pub dataplanes: Vec<String>,
    pub statuses: Vec<ExternalWorkloadStatus>,
    pub updated_before: Option<DateTime<Utc>>,
}

impl ListCommand {
    // Flags that were not given mean "no filter", never "match nothing".
    fn dataplane_filter(&self) -> Option<Vec<String>> {
        (!self.dataplanes.is_empty()).then(|| self.dataplanes.clone())
    }

    fn status_filter(&self) -> Option<Vec<WorkloadStatus>> {
        (!self.statuses.is_empty())
            .then(|| self.statuses.iter().copied().map(WorkloadStatus::from).collect())
    }
}

impl Command for ListCommand {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()> {
        let workloads = manager
            .get_workloads(
                self.dataplane_filter(),
                self.status_filter(),
                self.updated_before,
            )
            .await?;
        let rendered: Vec<Value> = workloads.iter().map(workload_json).collect();
        print_json(&Value::Array(rendered))
    }
}
