//! # Repository Module
//!
//! Database repository implementations for GRN reconciliation.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Reconciler / binaries                                                 │
//! │       │                                                                 │
//! │       │  db.grns().get_by_number("GRN-2025-11-001")                    │
//! │       ▼                                                                 │
//! │  GrnRepository / CatalogRepository / UidRepository                     │
//! │  ├── methods on &self          → run against the pool                  │
//! │  └── pub(crate) free functions → generic over sqlx::Executor, so the   │
//! │                                  Reconciler can pass `&mut *tx`        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Item master lookup by code
//! - [`grn::GrnRepository`] - GRN headers and line items
//! - [`uid::UidRepository`] - Unit identifier registry

pub mod catalog;
pub mod grn;
pub mod uid;
