//! # grn-core: Pure Business Logic for GRN Reconciliation
//!
//! Everything needed to judge a goods-receipt note, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     GRN Reconciliation Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              grn-recon / seed binaries (grn-db)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             Reconciler + repositories (grn-db)                  │   │
//! │  │        batched lookups, transactions, UID inserts               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ grn-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌───────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │  money  │ │ reconcile │ │ audit │ │   uid    │ │   │
//! │  │   │ Grn     │ │ Money   │ │ balance   │ │ count │ │ codes    │ │   │
//! │  │   │ LineItem│ │ parse   │ │ status    │ │ vs qty│ │ checksum │ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └───────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - GRN, line item, catalog item and UID records
//! - [`money`] - Integer money with exact decimal parsing
//! - [`reconcile`] - Payment reconciliation and debit-note cross-check
//! - [`audit`] - UID count classification
//! - [`uid`] - UID code sequence and checksum
//! - [`validation`] - Identifier validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use grn_core::reconcile::{reconcile_payment, PaymentFigures};
//!
//! let figures = PaymentFigures::parse("1000", "100", "900", Some("500")).unwrap();
//! let recon = reconcile_payment(&figures).unwrap();
//!
//! assert_eq!(recon.balance.to_string(), "400.00");
//! assert!(!recon.should_be_paid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod uid;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::{UidAudit, UidAuditStatus};
pub use error::{AmountError, ValidationError};
pub use money::Money;
pub use reconcile::{PaymentFigures, PaymentReconciliation};
pub use types::*;
