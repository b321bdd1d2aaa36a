//! Spyglass persistence layer
//!
//! PostgreSQL-backed stores for player/server identities, hit and track
//! events, and player-presence intervals, behind a single [`Database`]
//! handle wrapping a deadpool connection pool.
//!
//! The handle is constructed explicitly by the process root from a
//! [`DbConfig`] and passed down to every component; there is no global
//! pool. Each logical operation checks out one pooled connection and
//! releases it on every exit path. Multi-statement operations (presence
//! bulk writes, track appends) hold that one connection for their
//! duration but never open transactions spanning operations.

mod config;
mod error;
mod events;
mod identity;
mod presence;

pub use config::DbConfig;
pub use error::{DbError, DbResult, InsertOutcome};

use deadpool_postgres::Pool;

/// Handle to the Spyglass database.
///
/// Cheap to clone; all clones share the same underlying pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Wrap an already-built connection pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build the pool from configuration and wrap it.
    pub fn from_config(config: &DbConfig) -> DbResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Current pool size, for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Check out a connection from the pool.
    pub(crate) async fn get_conn(&self) -> DbResult<deadpool_postgres::Object> {
        Ok(self.pool.get().await?)
    }
}
