use anyhow::{Context, Result};
use serde_json::json;

use super::{print_json, Command};
use crate::workload::WorkloadLifecycleManager;

pub struct ClaimCommand {
    pub id: String,
    pub dataplane_id: String,
}

impl ClaimCommand {
    /// Claim as `dataplane_id`, or as this host when none is given
    pub fn new(id: impl Into<String>, dataplane_id: Option<String>) -> Result<Self> {
        let dataplane_id = match dataplane_id {
            Some(dataplane_id) => dataplane_id,
            None => default_dataplane_id()?,
        };
        Ok(Self {
            id: id.into(),
            dataplane_id,
        })
    }
}

fn default_dataplane_id() -> Result<String> {
    let name = hostname::get().context("Failed to read host name for default dataplane id")?;
    Ok(name.to_string_lossy().into_owned())
}

impl Command for ClaimCommand {
    async fn execute(&self, manager: &WorkloadLifecycleManager) -> Result<()> {
        // A lost race is a normal answer, not a failure.
        let claimed = manager.claim_workload(&self.id, &self.dataplane_id).await?;
        print_json(&json!({
            "id": self.id,
            "dataplaneId": self.dataplane_id,
            "claimed": claimed,
        }))
    }
}
