use anyhow::Result;
use clap::Parser;

use workload_lifecycle::cli::{commands, Cli};
use workload_lifecycle::{config, init_config, init_telemetry, WorkloadLifecycleConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match cli.config.as_deref() {
        Some(path) => {
            WorkloadLifecycleConfig::load_env_file()?;
            WorkloadLifecycleConfig::load_from_file(path)?
        }
        None => config()?.clone(),
    };

    init_telemetry(&settings.observability)?;
    if cli.config.is_none() {
        init_config()?;
    }

    tokio::runtime::Runtime::new()?.block_on(async {
        let manager = commands::open_manager(&settings).await?;
        commands::run(cli.command, &manager).await
    })
}
