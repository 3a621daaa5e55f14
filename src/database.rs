#[cfg(feature = "database")]
use anyhow::Result;
#[cfg(feature = "database")]
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
#[cfg(feature = "database")]
use sqlx::SqlitePool;
#[cfg(feature = "database")]
use std::str::FromStr;
#[cfg(feature = "database")]
use tracing::info;

#[cfg(feature = "database")]
use crate::config::StoreConfig;

#[cfg(feature = "database")]
/// Database manager for persistent workload storage
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

#[cfg(feature = "database")]
impl DatabaseManager {
    /// Open the pool, creating the database file if needed, and migrate
    pub async fn new(database_url: &str, max_connections: u32, auto_migrate: bool) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to an in-memory database opens a fresh, empty one.
        let max_connections = if is_in_memory(database_url) {
            1
        } else {
            max_connections.max(1)
        };

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !is_in_memory(database_url) {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at {}", database_url);
        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if is_in_memory(database_url) {
            // Recycling the only connection would drop the database with it.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        if auto_migrate {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(&config.url, config.max_connections, config.auto_migrate).await
    }

    /// Get database pool for queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close database connections gracefully
    pub async fn shutdown(&self) {
        info!("Shutting down database connections...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}

#[cfg(feature = "database")]
fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
