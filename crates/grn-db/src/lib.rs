//! # grn-db: Database Layer for GRN Reconciliation
//!
//! Storage access and the reconciliation service for goods-receipt notes.
//! It uses SQLite through sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     GRN Reconciliation Data Flow                        │
//! │                                                                         │
//! │  grn-recon GRN-2025-11-001 --apply                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     grn-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Reconciler  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ CatalogRepo   │    │ repair lines │  │   │
//! │  │   │ SqlitePool    │◄───│ GrnRepo       │◄───│ audit UIDs   │  │   │
//! │  │   │ Migrations    │    │ UidRepo       │    │ payment      │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SQLite: grn, grn_items, items, uid_registry                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, GRN and UID registry repositories
//! - [`reconciler`] - Repair, audit, payment and UID backfill
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grn_db::{Database, ReconConfig, ReconcileOptions};
//!
//! let config = ReconConfig::load()?;
//! let db = Database::connect(config.db_config()).await?;
//!
//! let report = db
//!     .reconciler()
//!     .reconcile("GRN-2025-11-001", &ReconcileOptions::read_only())
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod reconciler;
pub mod repository;

#[cfg(test)]
mod fixtures;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, ReconConfig, UidSettings};
pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};
pub use reconciler::{
    GrnReport, PaymentCheck, ReconcileOptions, Reconciler, RepairOutcome, RepairReport,
    UidBackfillReport,
};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::grn::GrnRepository;
pub use repository::uid::UidRepository;
