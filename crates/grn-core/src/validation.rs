//! # Validation Module
//!
//! Input validation for identifiers handed to the reconciler.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Config / CLI arguments                                       │
//! │  └── THIS MODULE: codes, GRN numbers, quantities                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Reconciliation (reconcile.rs)                                │
//! │  └── AmountError for negative / malformed amounts                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (grn_number, items.code, uid)                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of an item code.
pub const MAX_ITEM_CODE_LEN: usize = 50;

/// Maximum length of a tenant or plant code embedded in UIDs.
pub const MAX_UID_PART_LEN: usize = 8;

/// Validates a catalog item code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 50 characters
///
/// ## Example
/// ```rust
/// use grn_core::validation::validate_item_code;
///
/// assert!(validate_item_code("RM-CU-001").is_ok());
/// assert!(validate_item_code("  ").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "item_code".to_string(),
        });
    }

    if code.len() > MAX_ITEM_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "item_code".to_string(),
            max: MAX_ITEM_CODE_LEN,
        });
    }

    Ok(())
}

/// Validates a GRN number and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - Must start with `GRN-`
pub fn validate_grn_number(number: &str) -> ValidationResult<String> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "grn_number".to_string(),
        });
    }

    if !number.starts_with("GRN-") {
        return Err(ValidationError::InvalidFormat {
            field: "grn_number".to_string(),
            reason: "must start with GRN-".to_string(),
        });
    }

    Ok(number.to_string())
}

/// Validates a tenant or plant code used inside UIDs.
///
/// ## Rules
/// - 1 to 8 characters
/// - Upper-case ASCII letters and digits only (a `-` would break parsing)
///
/// ## Example
/// ```rust
/// use grn_core::validation::validate_uid_part;
///
/// assert!(validate_uid_part("tenant_code", "SAIF").is_ok());
/// assert!(validate_uid_part("plant_code", "kol").is_err());
/// assert!(validate_uid_part("plant_code", "K-1").is_err());
/// ```
pub fn validate_uid_part(field: &str, value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_UID_PART_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_UID_PART_LEN,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only A-Z and 0-9".to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity on a GRN line.
///
/// ## Rules
/// - Must be non-negative (zero is a fully rejected line)
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
