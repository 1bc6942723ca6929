//! # Errors
//!
//! Everything the repositories and the [`Reconciler`](crate::Reconciler)
//! can fail with. Variants carry the GRN, line or UID they were working on
//! so `grn-recon` can print an actionable message.
//!
//! A catalog miss on a single line is not an error. It is reported as
//! `RepairOutcome::NotFound` and the remaining lines are still processed.

use grn_core::{AmountError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No GRN (or other row) with this id / number.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A stored money field of the GRN cannot be reconciled.
    #[error("GRN {grn_id} has an invalid amount: {source}")]
    InvalidAmount {
        grn_id: String,
        #[source]
        source: AmountError,
    },

    /// A write was rejected (trigger, constraint, failed commit).
    #[error("Failed to persist {entity} {id}: {reason}")]
    PersistenceFailure {
        entity: String,
        id: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// No further UID can be issued under `prefix`.
    #[error("Cannot continue UID sequence {prefix}: {reason}")]
    UidSequence { prefix: String, reason: String },

    /// `constraint` is the `table.column` SQLite names in its message.
    #[error("{constraint} already exists")]
    UniqueViolation { constraint: String },

    #[error("Referenced row missing: {0}")]
    ForeignKeyViolation(String),

    #[error("Cannot reach GRN store: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Query failed: {0}")]
    Query(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn persistence(
        entity: impl Into<String>,
        id: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        DbError::PersistenceFailure {
            entity: entity.into(),
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Tags an amount problem with the GRN it was found on.
    pub fn invalid_amount(grn_id: impl Into<String>, source: AmountError) -> Self {
        DbError::InvalidAmount {
            grn_id: grn_id.into(),
            source,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // Lookups by id use fetch_optional and raise NotFound with the id
            // themselves; a missing row here has no identifier to report.
            sqlx::Error::RowNotFound => DbError::Query(err.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DbError::ConnectionFailed(err.to_string())
            }
            sqlx::Error::Database(ref db_err) => {
                // "UNIQUE constraint failed: items.tenant_id, items.code"
                // "FOREIGN KEY constraint failed"
                let msg = db_err.message();
                match msg.strip_prefix("UNIQUE constraint failed: ") {
                    Some(constraint) => DbError::UniqueViolation {
                        constraint: constraint.to_string(),
                    },
                    None if msg.starts_with("FOREIGN KEY") => {
                        DbError::ForeignKeyViolation(msg.to_string())
                    }
                    None => DbError::Query(msg.to_string()),
                }
            }
            other => DbError::Query(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
