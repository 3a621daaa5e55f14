use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::workload::{ExternalWorkloadStatus, WorkloadLabel};

pub mod commands;

#[derive(Parser)]
#[command(name = "workload-lifecycle")]
#[command(about = "Track workloads from creation through claim, heartbeat and completion")]
#[command(long_about = "workload-lifecycle is the bookkeeping core for dataplanes that poll for work. \
                       Workloads are created pending, claimed by exactly one dataplane, kept alive with \
                       heartbeats and finished with an administrative status update.")]
pub struct Cli {
    /// Configuration file (defaults to workload-lifecycle.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new pending workload
    Create {
        /// Caller-assigned, globally unique workload id
        id: String,
        /// Label to attach, repeatable and order-preserving
        #[arg(long = "label", value_parser = parse_label, help = "Label as KEY=VALUE")]
        labels: Vec<WorkloadLabel>,
    },
    /// Show one workload
    Get { id: String },
    /// List workloads matching every given filter
    List {
        /// Owning dataplane, repeatable
        #[arg(long = "dataplane")]
        dataplanes: Vec<String>,
        /// Status, repeatable (PENDING, CLAIMED, RUNNING, SUCCESS, FAILURE, CANCELLED)
        #[arg(long = "status", value_parser = parse_status)]
        statuses: Vec<ExternalWorkloadStatus>,
        /// Only workloads last written before this RFC 3339 instant
        #[arg(long, value_parser = parse_timestamp)]
        updated_before: Option<DateTime<Utc>>,
    },
    /// Overwrite a workload's status without transition checks (administrative)
    Update {
        id: String,
        #[arg(long, value_parser = parse_status)]
        status: ExternalWorkloadStatus,
    },
    /// Assert liveness of a claimed or running workload
    Heartbeat { id: String },
    /// Try to take ownership of a pending workload
    Claim {
        id: String,
        /// Claiming dataplane id (defaults to this host's name)
        #[arg(long = "dataplane")]
        dataplane_id: Option<String>,
    },
}

pub fn parse_label(raw: &str) -> Result<WorkloadLabel, String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(WorkloadLabel::new(key, value)),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

pub fn parse_status(raw: &str) -> Result<ExternalWorkloadStatus, String> {
    raw.parse().map_err(|e: crate::workload::ParseStatusError| e.to_string())
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp {raw:?}: {e}"))
}
