//! # Domain Types
//!
//! Records read from and written to the four reconciliation tables.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1   * ┌─────────────────┐ *   0..1 ┌────────────┐ │
//! │  │      Grn        │──────►│  GrnLineItem    │─────────►│CatalogItem │ │
//! │  │  ─────────────  │       │  ─────────────  │  item_id │ ────────── │ │
//! │  │  grn_number     │       │  item_code      │ (may be  │ code (uniq)│ │
//! │  │  amounts (¢)    │       │  accepted_qty   │  NULL)   │ category   │ │
//! │  │  payment_status │       │  rate_cents     │          └────────────┘ │
//! │  └────────┬────────┘       └─────────────────┘                         │
//! │           │ 1                                                           │
//! │           │        *  ┌─────────────────┐                               │
//! │           └──────────►│   UidRecord     │  one per physical unit        │
//! │                       │  uid, status    │  expected count =             │
//! │                       │  lifecycle JSON │  Σ accepted_qty               │
//! │                       └─────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (`grn_number`, `code`, `uid`) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::reconcile::PaymentFigures;

// =============================================================================
// GRN Status
// =============================================================================

/// Lifecycle status of a goods-receipt note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum GrnStatus {
    /// Being captured at the dock.
    Draft,
    /// Submitted; stock and payables are live.
    Completed,
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment status of a GRN.
///
/// `Paid` holds exactly when `paid_amount >= net_payable_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// Nothing paid yet.
    Unpaid,
    /// Something paid, balance outstanding.
    Partial,
    /// Paid in full (or overpaid).
    Paid,
}

impl PaymentStatus {
    /// Derives the status from paid and net payable amounts.
    ///
    /// ## Example
    /// ```rust
    /// use grn_core::{Money, PaymentStatus};
    ///
    /// let net = Money::from_cents(90_000);
    /// assert_eq!(PaymentStatus::derive(Money::from_cents(90_000), net), PaymentStatus::Paid);
    /// assert_eq!(PaymentStatus::derive(Money::from_cents(50_000), net), PaymentStatus::Partial);
    /// assert_eq!(PaymentStatus::derive(Money::zero(), net), PaymentStatus::Unpaid);
    /// ```
    pub fn derive(paid: Money, net_payable: Money) -> Self {
        if paid >= net_payable {
            PaymentStatus::Paid
        } else if paid.is_positive() {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }

    /// Upper-case label as stored in the `payment_status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Paid => "PAID",
        }
    }
}

// =============================================================================
// GRN
// =============================================================================

/// A goods-receipt note header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Grn {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this GRN belongs to.
    pub tenant_id: String,

    /// Human-readable number, `GRN-YYYY-MM-NNN`.
    pub grn_number: String,

    pub status: GrnStatus,

    pub gross_amount_cents: i64,

    /// Sum of debit notes raised against rejected goods.
    pub debit_note_amount_cents: i64,

    pub net_payable_amount_cents: i64,

    /// Amount paid so far. `None` means nothing recorded (treated as zero).
    pub paid_amount_cents: Option<i64>,

    pub payment_status: PaymentStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Grn {
    /// Gross amount as Money.
    #[inline]
    pub fn gross(&self) -> Money {
        Money::from_cents(self.gross_amount_cents)
    }

    /// Debit note amount as Money.
    #[inline]
    pub fn debit_note(&self) -> Money {
        Money::from_cents(self.debit_note_amount_cents)
    }

    /// Net payable amount as Money.
    #[inline]
    pub fn net_payable(&self) -> Money {
        Money::from_cents(self.net_payable_amount_cents)
    }

    /// Paid amount as Money, zero when absent.
    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_amount_cents.unwrap_or(0))
    }

    /// Bundles the four amounts for [`crate::reconcile::reconcile_payment`].
    pub fn payment_figures(&self) -> PaymentFigures {
        PaymentFigures {
            gross: self.gross(),
            debit_note: self.debit_note(),
            net_payable: self.net_payable(),
            paid: self.paid_amount_cents.map(Money::from_cents),
        }
    }
}

// =============================================================================
// GRN Line Item
// =============================================================================

/// One received line on a GRN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GrnLineItem {
    pub id: String,

    /// Owning GRN.
    pub grn_id: String,

    /// Catalog code as typed on the receipt.
    pub item_code: String,

    pub item_name: String,

    /// Catalog reference. `None` is the defect repaired by the reconciler.
    pub item_id: Option<String>,

    pub accepted_qty: i64,

    pub rejected_qty: i64,

    /// Unit rate in cents.
    pub rate_cents: i64,

    /// Value of rejected goods, expected to be `rejected_qty × rate`.
    pub rejection_amount_cents: i64,

    pub batch_number: Option<String>,
}

impl GrnLineItem {
    /// Whether the catalog reference is missing.
    #[inline]
    pub fn needs_repair(&self) -> bool {
        self.item_id.is_none()
    }

    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }

    #[inline]
    pub fn rejection_amount(&self) -> Money {
        Money::from_cents(self.rejection_amount_cents)
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// An item master entry. Referenced, never owned, by GRN lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CatalogItem {
    pub id: String,

    pub tenant_id: String,

    /// Unique item code.
    pub code: String,

    pub name: String,

    /// Free-text category (e.g. "RAW MATERIAL", "COMPONENT - PCB").
    pub category: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl CatalogItem {
    /// UID entity type implied by the category.
    pub fn entity_type(&self) -> EntityType {
        EntityType::from_category(self.category.as_deref())
    }
}

// =============================================================================
// Entity Type
// =============================================================================

/// Kind of physical unit a UID is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum EntityType {
    #[serde(rename = "RM")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "RM"))]
    RawMaterial,
    #[serde(rename = "CP")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "CP"))]
    Component,
    #[serde(rename = "FG")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "FG"))]
    FinishedGood,
    #[serde(rename = "SA")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SA"))]
    SubAssembly,
}

impl EntityType {
    /// Maps an item category onto an entity type.
    ///
    /// Matching is case-insensitive; anything unrecognised (or missing)
    /// is raw material.
    ///
    /// ## Example
    /// ```rust
    /// use grn_core::EntityType;
    ///
    /// assert_eq!(EntityType::from_category(Some("COMPONENT - PCB")), EntityType::Component);
    /// assert_eq!(EntityType::from_category(Some("Finished Goods")), EntityType::FinishedGood);
    /// assert_eq!(EntityType::from_category(None), EntityType::RawMaterial);
    /// ```
    pub fn from_category(category: Option<&str>) -> Self {
        let category = category.unwrap_or_default().to_uppercase();
        if category.contains("COMPONENT") {
            EntityType::Component
        } else if category.contains("FINISHED") {
            EntityType::FinishedGood
        } else if category.contains("ASSEMBLY") {
            EntityType::SubAssembly
        } else {
            EntityType::RawMaterial
        }
    }

    /// Two-letter code used in UIDs and the `entity_type` column.
    pub fn code(&self) -> &'static str {
        match self {
            EntityType::RawMaterial => "RM",
            EntityType::Component => "CP",
            EntityType::FinishedGood => "FG",
            EntityType::SubAssembly => "SA",
        }
    }
}

// =============================================================================
// UID Record
// =============================================================================

/// Status given to freshly received units.
pub const UID_STATUS_AVAILABLE: &str = "AVAILABLE";

/// One entry in a unit's lifecycle history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Stage name, e.g. `RECEIVED`.
    pub stage: String,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    /// Business document that caused the event (GRN number for receipts).
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl LifecycleEvent {
    /// A `RECEIVED` event for goods booked in against a GRN.
    pub fn received(location: &str, grn_number: &str, at: DateTime<Utc>) -> Self {
        LifecycleEvent {
            stage: "RECEIVED".to_string(),
            timestamp: at,
            location: location.to_string(),
            reference: grn_number.to_string(),
            user: None,
        }
    }
}

/// Back-reference from a unit to the receipt line it came from.
///
/// Units registered outside a GRN carry an empty object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UidMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grn_item_id: Option<String>,
}

/// A unit identifier issued for one physical unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UidRecord {
    pub id: String,

    pub tenant_id: String,

    /// `UID-{TENANT}-{PLANT}-{TYPE}-{SEQ}-{CHECKSUM}`.
    pub uid: String,

    pub entity_type: EntityType,

    /// Catalog item this unit is an instance of.
    pub entity_id: Option<String>,

    /// GRN the unit was received on.
    pub grn_id: Option<String>,

    pub batch_number: Option<String>,

    pub status: String,

    pub location: String,

    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub lifecycle: Vec<LifecycleEvent>,

    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub metadata: UidMetadata,

    pub created_at: DateTime<Utc>,
}
