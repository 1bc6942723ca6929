//! # UID Registry Repository
//!
//! Storage for unit identifiers: one row per physical unit received.
//!
//! `lifecycle` and `metadata` are JSON text columns, decoded through
//! `#[sqlx(json)]` on [`UidRecord`].

use sqlx::types::Json;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::{DbError, DbResult};
use grn_core::uid::parse_sequence;
use grn_core::UidRecord;

/// Repository for UID registry operations.
#[derive(Debug, Clone)]
pub struct UidRepository {
    pool: SqlitePool,
}

impl UidRepository {
    /// Creates a new UidRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UidRepository { pool }
    }

    /// Inserts a UID record.
    pub async fn insert(&self, record: &UidRecord) -> DbResult<()> {
        insert(&self.pool, record).await
    }

    /// Number of UIDs referencing a GRN.
    pub async fn count_for_grn(&self, grn_id: &str) -> DbResult<i64> {
        count_for_grn(&self.pool, grn_id).await
    }

    /// All UIDs referencing a GRN, ordered by code.
    pub async fn list_for_grn(&self, grn_id: &str) -> DbResult<Vec<UidRecord>> {
        let records = sqlx::query_as::<_, UidRecord>(
            r#"
            SELECT
                id, tenant_id, uid, entity_type, entity_id, grn_id,
                batch_number, status, location, lifecycle, metadata,
                created_at
            FROM uid_registry
            WHERE grn_id = ?1
            ORDER BY length(uid), uid
            "#,
        )
        .bind(grn_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Highest sequence issued under `prefix` (0 when none).
    pub async fn last_sequence(&self, prefix: &str) -> DbResult<u64> {
        last_sequence(&self.pool, prefix).await
    }
}

// =============================================================================
// Executor-generic queries (usable inside a transaction)
// =============================================================================

pub(crate) async fn insert<'e, E>(executor: E, record: &UidRecord) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO uid_registry (
            id, tenant_id, uid, entity_type, entity_id, grn_id,
            batch_number, status, location, lifecycle, metadata,
            created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12
        )
        "#,
    )
    .bind(&record.id)
    .bind(&record.tenant_id)
    .bind(&record.uid)
    .bind(record.entity_type)
    .bind(&record.entity_id)
    .bind(&record.grn_id)
    .bind(&record.batch_number)
    .bind(&record.status)
    .bind(&record.location)
    .bind(Json(&record.lifecycle))
    .bind(Json(&record.metadata))
    .bind(record.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn count_for_grn<'e, E>(executor: E, grn_id: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM uid_registry WHERE grn_id = ?1")
        .bind(grn_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

/// Codes under one prefix differ only in the sequence field, and that field
/// is zero-padded to six digits and widens beyond them, so the longest and
/// then lexically greatest code carries the highest sequence.
pub(crate) async fn last_sequence<'e, E>(executor: E, prefix: &str) -> DbResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let last: Option<String> = sqlx::query_scalar(
        r#"
        SELECT uid FROM uid_registry
        WHERE substr(uid, 1, length(?1)) = ?1
        ORDER BY length(uid) DESC, uid DESC
        LIMIT 1
        "#,
    )
    .bind(prefix)
    .fetch_optional(executor)
    .await?;

    match last {
        None => Ok(0),
        Some(uid) => parse_sequence(&uid).ok_or_else(|| DbError::UidSequence {
            prefix: prefix.to_string(),
            reason: format!("highest code {uid} has no readable sequence"),
        }),
    }
}
