mod error;
pub mod repos;
pub mod sqlite;

#[cfg(test)]
pub mod tests;

use std::{sync::Arc, time::Duration};

pub use error::{DbError, DbResult};
pub use repos::*;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::config::DatabaseConfig;

/// Handle to the panel database.
///
/// Built once at startup and shared through the application state.
/// Repositories are cached at construction time to avoid allocation on each access.
pub struct DbPool {
    pool: sqlx::SqlitePool,
    client_traffic: Arc<dyn ClientTrafficRepo>,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        Self {
            client_traffic: Arc::new(sqlite::SqliteClientTrafficRepo::new(pool.clone())),
            pool,
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        let cfg = config.sqlite();

        let mut options = SqliteConnectOptions::new()
            .filename(&cfg.path)
            .create_if_missing(cfg.create_if_missing)
            .read_only(cfg.read_only)
            .busy_timeout(Duration::from_millis(cfg.busy_timeout_ms));

        // Switching journal mode is a write; a read-only handle keeps whatever
        // mode the panel chose.
        if cfg.wal_mode && !cfg.read_only {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect_with(options)
            .await?;

        tracing::debug!(
            path = %cfg.path,
            read_only = cfg.read_only,
            wal_mode = cfg.wal_mode,
            "Connected to panel database"
        );

        Ok(Self::from_sqlite(pool))
    }

    pub fn client_traffic(&self) -> Arc<dyn ClientTrafficRepo> {
        Arc::clone(&self.client_traffic)
    }

    /// Run a trivial query to confirm the database answers.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
