//! # GRN Repository
//!
//! Database operations for GRN headers and their line items.
//!
//! ## GRN Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         GRN Lifecycle                                   │
//! │                                                                         │
//! │  1. RECEIVE                                                            │
//! │     └── insert() → Grn { status: Draft, payment_status: Unpaid }       │
//! │     └── insert_item() → GrnLineItem (item_id may be NULL)              │
//! │                                                                         │
//! │  2. REPAIR (Reconciler)                                                │
//! │     └── set_item_catalog_ref() → only fills a NULL item_id             │
//! │                                                                         │
//! │  3. PAY                                                                │
//! │     └── record_payment() → paid_amount += amount                       │
//! │     └── update_payment_status() → UNPAID | PARTIAL | PAID              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries that the reconciler must run inside its transaction are exposed
//! as executor-generic `pub(crate)` functions next to the repository.

use chrono::{DateTime, Datelike, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use grn_core::validation::{validate_grn_number, validate_item_code, validate_quantity};
use grn_core::{Grn, GrnLineItem, Money, PaymentStatus};

const SELECT_GRN: &str = r#"
    SELECT
        id, tenant_id, grn_number, status,
        gross_amount_cents, debit_note_amount_cents,
        net_payable_amount_cents, paid_amount_cents,
        payment_status, created_at, updated_at
    FROM grn
"#;

const SELECT_LINES: &str = r#"
    SELECT
        id, grn_id, item_code, item_name, item_id,
        accepted_qty, rejected_qty, rate_cents,
        rejection_amount_cents, batch_number
    FROM grn_items
"#;

/// Repository for GRN database operations.
#[derive(Debug, Clone)]
pub struct GrnRepository {
    pool: SqlitePool,
}

impl GrnRepository {
    /// Creates a new GrnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GrnRepository { pool }
    }

    /// Gets a GRN by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Grn>> {
        get_by_id(&self.pool, id).await
    }

    /// Gets a GRN by its human-readable number (`GRN-2025-11-001`).
    pub async fn get_by_number(&self, grn_number: &str) -> DbResult<Option<Grn>> {
        get_by_number(&self.pool, grn_number).await
    }

    /// Gets all line items of a GRN, in insertion order.
    pub async fn list_items(&self, grn_id: &str) -> DbResult<Vec<GrnLineItem>> {
        list_items(&self.pool, grn_id).await
    }

    /// Inserts a GRN header.
    pub async fn insert(&self, grn: &Grn) -> DbResult<()> {
        validate_grn_number(&grn.grn_number)?;
        debug!(id = %grn.id, grn_number = %grn.grn_number, "Inserting GRN");

        sqlx::query(
            r#"
            INSERT INTO grn (
                id, tenant_id, grn_number, status,
                gross_amount_cents, debit_note_amount_cents,
                net_payable_amount_cents, paid_amount_cents,
                payment_status, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11
            )
            "#,
        )
        .bind(&grn.id)
        .bind(&grn.tenant_id)
        .bind(&grn.grn_number)
        .bind(grn.status)
        .bind(grn.gross_amount_cents)
        .bind(grn.debit_note_amount_cents)
        .bind(grn.net_payable_amount_cents)
        .bind(grn.paid_amount_cents)
        .bind(grn.payment_status)
        .bind(grn.created_at)
        .bind(grn.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a GRN line item.
    pub async fn insert_item(&self, item: &GrnLineItem) -> DbResult<()> {
        validate_item_code(&item.item_code)?;
        validate_quantity("accepted_qty", item.accepted_qty)?;
        validate_quantity("rejected_qty", item.rejected_qty)?;

        debug!(grn_id = %item.grn_id, item_code = %item.item_code, "Adding GRN line");

        sqlx::query(
            r#"
            INSERT INTO grn_items (
                id, grn_id, item_code, item_name, item_id,
                accepted_qty, rejected_qty, rate_cents,
                rejection_amount_cents, batch_number
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.grn_id)
        .bind(&item.item_code)
        .bind(&item.item_name)
        .bind(&item.item_id)
        .bind(item.accepted_qty)
        .bind(item.rejected_qty)
        .bind(item.rate_cents)
        .bind(item.rejection_amount_cents)
        .bind(&item.batch_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fills the catalog reference of a line whose `item_id` is NULL.
    ///
    /// Returns `false` when no row was changed (unknown line, or a
    /// reference was already present).
    pub async fn set_item_catalog_ref(&self, line_id: &str, item_id: &str) -> DbResult<bool> {
        set_item_catalog_ref(&self.pool, line_id, item_id).await
    }

    /// Overwrites the stored payment status.
    pub async fn update_payment_status(&self, grn_id: &str, status: PaymentStatus) -> DbResult<()> {
        update_payment_status(&self.pool, grn_id, status).await
    }

    /// Adds a payment to the GRN's paid amount.
    ///
    /// The payment status is left untouched; run
    /// [`crate::Reconciler::sync_payment_status`] afterwards.
    pub async fn record_payment(&self, grn_id: &str, amount: Money) -> DbResult<()> {
        let amount = amount
            .ensure_non_negative("paid_amount")
            .map_err(|e| DbError::invalid_amount(grn_id, e))?;

        debug!(grn_id = %grn_id, amount = %amount, "Recording payment");

        let result = sqlx::query(
            r#"
            UPDATE grn SET
                paid_amount_cents = COALESCE(paid_amount_cents, 0) + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(grn_id)
        .bind(amount.cents())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("GRN", grn_id));
        }

        Ok(())
    }

    /// Sum of accepted quantity over the GRN's lines (0 when none).
    pub async fn accepted_total(&self, grn_id: &str) -> DbResult<i64> {
        accepted_total(&self.pool, grn_id).await
    }

    /// Next free GRN number for the month of `at`, `GRN-YYYY-MM-NNN`.
    pub async fn next_grn_number(&self, at: DateTime<Utc>) -> DbResult<String> {
        let prefix = format!("GRN-{:04}-{:02}-", at.year(), at.month());

        let last: Option<String> = sqlx::query_scalar(
            r#"
            SELECT grn_number FROM grn
            WHERE grn_number LIKE ?1 || '%'
            ORDER BY length(grn_number) DESC, grn_number DESC
            LIMIT 1
            "#,
        )
        .bind(&prefix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(grn_number_after(&prefix, last.as_deref()))
    }
}

// =============================================================================
// Executor-generic queries (usable inside a transaction)
// =============================================================================

pub(crate) async fn get_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Grn>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let grn = sqlx::query_as::<_, Grn>(&format!("{SELECT_GRN} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(grn)
}

pub(crate) async fn get_by_number<'e, E>(executor: E, grn_number: &str) -> DbResult<Option<Grn>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let grn = sqlx::query_as::<_, Grn>(&format!("{SELECT_GRN} WHERE grn_number = ?1"))
        .bind(grn_number.trim())
        .fetch_optional(executor)
        .await?;

    Ok(grn)
}

pub(crate) async fn list_items<'e, E>(executor: E, grn_id: &str) -> DbResult<Vec<GrnLineItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let items = sqlx::query_as::<_, GrnLineItem>(&format!(
        "{SELECT_LINES} WHERE grn_id = ?1 ORDER BY rowid"
    ))
    .bind(grn_id)
    .fetch_all(executor)
    .await?;

    Ok(items)
}

pub(crate) async fn set_item_catalog_ref<'e, E>(
    executor: E,
    line_id: &str,
    item_id: &str,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE grn_items SET item_id = ?2 WHERE id = ?1 AND item_id IS NULL")
        .bind(line_id)
        .bind(item_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn update_payment_status<'e, E>(
    executor: E,
    grn_id: &str,
    status: PaymentStatus,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(grn_id = %grn_id, status = status.as_str(), "Updating payment status");

    let result = sqlx::query("UPDATE grn SET payment_status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(grn_id)
        .bind(status)
        .bind(Utc::now())
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("GRN", grn_id));
    }

    Ok(())
}

pub(crate) async fn accepted_total<'e, E>(executor: E, grn_id: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let total: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(accepted_qty), 0) FROM grn_items WHERE grn_id = ?1")
            .bind(grn_id)
            .fetch_one(executor)
            .await?;

    Ok(total)
}

/// Number following `last` within `prefix`; `001` when the month is empty
/// or the last number does not parse.
fn grn_number_after(prefix: &str, last: Option<&str>) -> String {
    let next = last
        .and_then(|n| n.strip_prefix(prefix))
        .and_then(|seq| seq.parse::<u64>().ok())
        .map_or(1, |seq| seq.saturating_add(1));

    format!("{prefix}{next:03}")
}

/// Generates a new GRN or line id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
