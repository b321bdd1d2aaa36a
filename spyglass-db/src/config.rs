//! Database connection pool configuration

use crate::DbResult;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::time::Duration;
use tokio_postgres::NoTls;

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "spyglass".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SPYGLASS_DB_HOST` (default: localhost)
    /// - `SPYGLASS_DB_PORT` (default: 5432)
    /// - `SPYGLASS_DB_NAME` (default: spyglass)
    /// - `SPYGLASS_DB_USER` (default: postgres)
    /// - `SPYGLASS_DB_PASSWORD` (default: empty)
    /// - `SPYGLASS_DB_POOL_SIZE` (default: 16)
    /// - `SPYGLASS_DB_TIMEOUT` (seconds, default: 30)
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SPYGLASS_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SPYGLASS_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("SPYGLASS_DB_NAME").unwrap_or_else(|_| "spyglass".to_string()),
            user: std::env::var("SPYGLASS_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("SPYGLASS_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("SPYGLASS_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("SPYGLASS_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> DbResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
        Ok(pool)
    }
}
