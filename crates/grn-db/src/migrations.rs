//! # Schema Migrations
//!
//! The schema (`grn`, `grn_items`, `items`, `uid_registry`) is compiled into
//! the binary from `migrations/sqlite/` at the workspace root.
//!
//! Files are named `NNN_what_changed.sql` and are append-only: once a file
//! has shipped, later schema changes go into a new file.

use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far a store's schema has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub embedded: usize,
    pub applied: usize,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Brings the schema up to date. Already-applied files are skipped.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let embedded = MIGRATOR.iter().count();
    MIGRATOR.run(pool).await?;
    info!(embedded, "GRN schema up to date");
    Ok(())
}

pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.iter().count(),
        applied: usize::try_from(applied).unwrap_or_default(),
    })
}
