//! Database connection management.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::CoreConfig;
use crate::error::{HopitalError, HopitalResult};

/// Handle on the hospital database.
///
/// Cheap to clone: the underlying pool is reference counted.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database named by the configuration.
    ///
    /// This will:
    /// 1. Create the parent directory and database file if they don't exist
    /// 2. Enable foreign keys so cascades and referential checks apply
    /// 3. Run any pending migrations
    pub async fn open(cfg: &CoreConfig) -> HopitalResult<Self> {
        let options = SqliteConnectOptions::from_str(cfg.database_url())?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("synchronous", "NORMAL")
            .foreign_keys(true);

        let filename = options.get_filename();
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(HopitalError::StorageDirCreation)?;
            }
        }

        info!("Opening hospital database: {}", filename.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        debug!("Database connection established");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open an in-memory database (for tests and throwaway runs).
    pub async fn open_in_memory() -> HopitalResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // In-memory must be single connection to share state, and that
        // connection must never be recycled.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> HopitalResult<()> {
        debug!("Running database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check if the database answers a trivial query.
    pub async fn health_check(&self) -> HopitalResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
