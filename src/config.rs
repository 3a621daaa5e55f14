use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the workload lifecycle service
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WorkloadLifecycleConfig {
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Where workload records live
    pub store: StoreConfig,
    /// State machine tuning
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local, lost on exit
    Memory,
    /// Durable SQLite database (requires the `database` feature)
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// How many times claim/heartbeat re-read after losing a conditional update
    pub max_conditional_retries: u32,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            url: "sqlite://.workload-lifecycle/workloads.db".to_string(),
            max_connections: 10,
            auto_migrate: true,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_conditional_retries: 8,
        }
    }
}

impl WorkloadLifecycleConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (workload-lifecycle.toml, .workload-lifecycle-rc)
    /// 3. Environment variables (prefixed with WORKLOAD_LIFECYCLE_, `__` between sections)
    pub fn load() -> Result<Self> {
        let mut builder = Self::defaults_builder()?;

        if Path::new("workload-lifecycle.toml").exists() {
            builder = builder.add_source(File::with_name("workload-lifecycle"));
        }

        if Path::new(".workload-lifecycle-rc").exists() {
            builder = builder.add_source(File::with_name(".workload-lifecycle-rc").format(config::FileFormat::Toml));
        }

        builder = builder.add_source(Self::environment());

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::defaults_builder()?
            .add_source(File::from(path))
            .add_source(Self::environment())
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    fn defaults_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Config::try_from(&Self::default())?;
        Ok(Config::builder().add_source(defaults))
    }

    fn environment() -> Environment {
        Environment::with_prefix("WORKLOAD_LIFECYCLE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<WorkloadLifecycleConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = WorkloadLifecycleConfig::load_env_file();
        WorkloadLifecycleConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static WorkloadLifecycleConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkloadLifecycleConfig::default();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.lifecycle.max_conditional_retries, 8);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workload-lifecycle.toml");
        std::fs::write(
            &path,
            "[store]\nbackend = \"memory\"\n\n[lifecycle]\nmax_conditional_retries = 3\n",
        )
        .unwrap();

        let config = WorkloadLifecycleConfig::load_from_file(&path).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.lifecycle.max_conditional_retries, 3);
        // Untouched keys keep their defaults.
        assert_eq!(config.store.max_connections, 10);
        assert!(!config.observability.json_logs);
    }

    #[test]
    fn test_save_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = WorkloadLifecycleConfig::default();
        config.store.url = "sqlite::memory:".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = WorkloadLifecycleConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.store.url, "sqlite::memory:");
    }
}
