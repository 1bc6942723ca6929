//! # Error Types
//!
//! Domain-specific error types for grn-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  grn-core errors (this file)                                           │
//! │  ├── AmountError      - Invalid financial fields (InvalidAmount)       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  grn-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: AmountError → DbError::InvalidAmount { grn_id } → caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the offending field and value in every message
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Amount Error
// =============================================================================

/// The `InvalidAmount` taxonomy.
///
/// Every variant names the field it was raised for so the caller can
/// report the offending GRN column.
///
/// ## When This Occurs
/// ```text
/// "abc"      → NotNumeric
/// "-5.00"    → Negative
/// "10.005"   → TooPrecise   (more than two decimal places)
/// "1e30"     → NotNumeric   (no exponent notation)
/// huge value → OutOfRange   (does not fit in i64 cents)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Value is below zero.
    #[error("{field} must not be negative (got {cents} cents)")]
    Negative { field: String, cents: i64 },

    /// Value could not be parsed as a decimal number.
    #[error("{field} is not numeric: '{value}'")]
    NotNumeric { field: String, value: String },

    /// Value has more than two decimal places.
    #[error("{field} has more than two decimal places: '{value}'")]
    TooPrecise { field: String, value: String },

    /// Value does not fit the integer cents representation.
    #[error("{field} is out of range: '{value}'")]
    OutOfRange { field: String, value: String },
}

impl AmountError {
    /// Returns the name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            AmountError::Negative { field, .. }
            | AmountError::NotNumeric { field, .. }
            | AmountError::TooPrecise { field, .. }
            | AmountError::OutOfRange { field, .. } => field,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. lowercase UID code, GRN number without `GRN-`).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
