//! # Catalog Repository
//!
//! Item master lookups by code.
//!
//! ## Batched Lookup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Per-line lookups (one round trip per unlinked line):                   │
//! │    SELECT id FROM items WHERE code = 'RM-001'                           │
//! │    SELECT id FROM items WHERE code = 'RM-002'                           │
//! │    ...                                                                  │
//! │                                                                         │
//! │  Batched (THIS MODULE, one round trip per GRN):                         │
//! │    SELECT ... FROM items WHERE code IN ('RM-001', 'RM-002', ...)        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    HashMap<code, id>  ← a code missing from the map is a per-line miss  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use grn_core::validation::validate_item_code;
use grn_core::CatalogItem;

const SELECT_ITEMS: &str = "SELECT id, tenant_id, code, name, category, created_at FROM items";

/// Repository for catalog item operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Resolves an item code to its catalog id.
    ///
    /// Not found is `Ok(None)`, never an error.
    pub async fn find_id_by_code(&self, code: &str) -> DbResult<Option<String>> {
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM items WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    /// Resolves many codes in one query. Codes absent from the catalog are
    /// absent from the map.
    pub async fn find_ids_by_codes(&self, codes: &[String]) -> DbResult<HashMap<String, String>> {
        let items = fetch_by_codes(&self.pool, codes).await?;
        Ok(items.into_iter().map(|item| (item.code, item.id)).collect())
    }

    /// Full records for the given codes, so callers can derive the UID
    /// entity type from `category`. Unknown codes are left out.
    pub async fn find_by_codes(&self, codes: &[String]) -> DbResult<Vec<CatalogItem>> {
        fetch_by_codes(&self.pool, codes).await
    }

    /// Inserts a catalog item.
    pub async fn insert(&self, item: &CatalogItem) -> DbResult<()> {
        validate_item_code(&item.code)?;
        debug!(id = %item.id, code = %item.code, "Inserting catalog item");

        sqlx::query(
            r#"
            INSERT INTO items (id, tenant_id, code, name, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.tenant_id)
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts catalog items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Executor-generic queries (usable inside a transaction)
// =============================================================================

/// Fetches catalog items whose code is in `codes`, in one statement.
pub(crate) async fn fetch_by_codes<'e, E>(executor: E, codes: &[String]) -> DbResult<Vec<CatalogItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_where_in(executor, "code", codes).await
}

/// Fetches catalog items whose id is in `ids`, in one statement.
pub(crate) async fn fetch_by_ids<'e, E>(executor: E, ids: &[String]) -> DbResult<Vec<CatalogItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    fetch_where_in(executor, "id", ids).await
}

async fn fetch_where_in<'e, E>(
    executor: E,
    column: &'static str,
    values: &[String],
) -> DbResult<Vec<CatalogItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if values.is_empty() {
        return Ok(Vec::new());
    }

    debug!(column, count = values.len(), "Batched catalog lookup");

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_ITEMS);
    builder.push(" WHERE ").push(column).push(" IN (");
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");

    let items = builder
        .build_query_as::<CatalogItem>()
        .fetch_all(executor)
        .await?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use crate::fixtures;
    use grn_core::EntityType;

    #[tokio::test]
    async fn test_find_id_by_code() {
        let db = fixtures::database().await;
        let item = fixtures::catalog_item("RM-CU-001", Some("RAW MATERIAL"));
        db.catalog().insert(&item).await.unwrap();

        let found = db.catalog().find_id_by_code("RM-CU-001").await.unwrap();
        assert_eq!(found, Some(item.id));
    }

    #[tokio::test]
    async fn test_unknown_code_is_none_not_error() {
        let db = fixtures::database().await;
        let found = db.catalog().find_id_by_code("NOPE").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_batched_lookup_returns_only_known_codes() {
        let db = fixtures::database().await;
        let a = fixtures::catalog_item("A-1", None);
        let b = fixtures::catalog_item("B-2", Some("COMPONENT"));
        db.catalog().insert(&a).await.unwrap();
        db.catalog().insert(&b).await.unwrap();

        let codes = vec!["A-1".to_string(), "B-2".to_string(), "C-3".to_string()];
        let map = db.catalog().find_ids_by_codes(&codes).await.unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A-1"), Some(&a.id));
        assert_eq!(map.get("B-2"), Some(&b.id));
        assert!(!map.contains_key("C-3"));

        let empty = db.catalog().find_ids_by_codes(&[]).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_codes_carries_category() {
        let db = fixtures::database().await;
        db.catalog()
            .insert(&fixtures::catalog_item("CP-PCB-010", Some("COMPONENT - PCB")))
            .await
            .unwrap();
        db.catalog()
            .insert(&fixtures::catalog_item("FG-FAN-030", Some("FINISHED GOODS")))
            .await
            .unwrap();

        let codes = vec!["FG-FAN-030".to_string(), "CP-PCB-010".to_string(), "GONE".to_string()];
        let mut items = db.catalog().find_by_codes(&codes).await.unwrap();
        items.sort_by(|a, b| a.code.cmp(&b.code));

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].entity_type(), EntityType::Component);
        assert_eq!(items[1].entity_type(), EntityType::FinishedGood);
        assert!(db.catalog().find_by_codes(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let db = fixtures::database().await;
        db.catalog()
            .insert(&fixtures::catalog_item("DUP", None))
            .await
            .unwrap();

        let err = db
            .catalog()
            .insert(&fixtures::catalog_item("DUP", None))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_blank_code_rejected() {
        let db = fixtures::database().await;
        let err = db
            .catalog()
            .insert(&fixtures::catalog_item("  ", None))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::Validation(_)));
        assert_eq!(db.catalog().count().await.unwrap(), 0);
    }
}
