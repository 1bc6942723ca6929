//! # Connection Pool
//!
//! Opens the SQLite store the reconciler works against and hands out
//! repositories that share one [`SqlitePool`].
//!
//! ```text
//!  ReconConfig::load()          DATABASE_URL, DB_MAX_CONNECTIONS
//!        │
//!        ▼
//!  ReconConfig::db_config()  →  DbConfig
//!        │
//!        ▼
//!  Database::connect(config)    open pool, apply embedded schema
//!        │
//!        ├── catalog()     items lookup
//!        ├── grns()        receipts + lines
//!        ├── uids()        unit-ID registry
//!        └── reconciler()  transactional repair / audit / payment
//! ```
//!
//! The connection string is never hard-coded here; it only arrives
//! through [`DbConfig`].

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::reconciler::Reconciler;
use crate::repository::catalog::CatalogRepository;
use crate::repository::grn::GrnRepository;
use crate::repository::uid::UidRepository;

const MEMORY_URL: &str = "sqlite::memory:";

/// Pool settings for [`Database::connect`].
///
/// ```rust,ignore
/// let config = DbConfig::new("sqlite://./grn.db?mode=rwc").max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// e.g. `sqlite://./grn.db?mode=rwc`
    pub database_url: String,
    /// Upper bound on pooled connections (5 unless overridden).
    pub max_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// `None` keeps idle connections open. An in-memory store disappears
    /// with its last connection, so it must be `None` there.
    pub idle_timeout: Option<Duration>,
    /// Apply embedded migrations right after the pool opens.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        DbConfig {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            migrate: true,
        }
    }

    /// Private throwaway store with the schema applied. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            database_url: MEMORY_URL.to_string(),
            // every connection would get its own empty database
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
            migrate: true,
        }
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Opens the pool without touching the schema.
    pub fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    fn is_memory(&self) -> bool {
        self.database_url.starts_with(MEMORY_URL) || self.database_url.contains("mode=memory")
    }
}

/// Handle to the reconciliation store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool described by `config`.
    ///
    /// Connections use WAL journaling with `synchronous = NORMAL` and
    /// enforce foreign keys (`grn_items.grn_id`, `uid_registry.grn_id`).
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        info!(
            max_connections = config.max_connections,
            in_memory = config.is_memory(),
            "Opening GRN store"
        );

        let mut options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true)
            .create_if_missing(true);

        if !config.is_memory() {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("GRN store pool ready");

        let db = Database { pool };
        if config.migrate {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    pub fn grns(&self) -> GrnRepository {
        GrnRepository::new(self.pool.clone())
    }

    pub fn uids(&self) -> UidRepository {
        UidRepository::new(self.pool.clone())
    }

    /// Repair, audit and payment checks, each run inside its own transaction.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.pool.clone())
    }

    /// `true` when a trivial query round-trips.
    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    pub async fn close(&self) {
        info!("Closing GRN store");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_has_schema() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        assert!(db.ping().await);

        let status = migrations::migration_status(db.pool()).await.unwrap();
        assert!(status.is_current());
        assert!(status.applied > 0);
    }

    #[tokio::test]
    async fn skip_migrations_leaves_store_empty() {
        let db = Database::connect(DbConfig::in_memory().skip_migrations())
            .await
            .unwrap();

        let tables: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE name = 'grn'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn builder_overrides() {
        let config = DbConfig::new("sqlite://./a.db")
            .database_url("sqlite://./b.db?mode=rwc")
            .max_connections(0)
            .acquire_timeout(Duration::from_secs(2));

        assert_eq!(config.database_url, "sqlite://./b.db?mode=rwc");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
        assert!(config.migrate);
        assert!(!config.is_memory());
        assert!(DbConfig::in_memory().is_memory());
    }
}
