//! # Payment Reconciliation
//!
//! Pure computation of a GRN's outstanding balance and payment status.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Payment Reconciliation                               │
//! │                                                                         │
//! │  gross_amount ─────┐                                                    │
//! │  debit_note_amount ┴──► expected_net = gross − debit_note               │
//! │                                │                                        │
//! │                                ▼  compared with stored                  │
//! │  net_payable_amount ─────► net_payable_consistent                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  balance = net_payable − paid          (paid absent → 0)                │
//! │  should_be_paid = paid ≥ net_payable                                    │
//! │  status = PAID | PARTIAL | UNPAID                                       │
//! │                                                                         │
//! │  Any negative input → AmountError::Negative (nothing is clamped)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use grn_core::money::Money;
//! use grn_core::reconcile::{reconcile_payment, PaymentFigures};
//!
//! let figures = PaymentFigures {
//!     gross: Money::from_cents(100_000),
//!     debit_note: Money::from_cents(10_000),
//!     net_payable: Money::from_cents(90_000),
//!     paid: Some(Money::from_cents(90_000)),
//! };
//! let recon = reconcile_payment(&figures).unwrap();
//! assert!(recon.balance.is_zero());
//! assert!(recon.should_be_paid);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::AmountError;
use crate::money::Money;
use crate::types::{GrnLineItem, PaymentStatus};

// =============================================================================
// Inputs
// =============================================================================

/// The four amounts a GRN carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFigures {
    pub gross: Money,
    pub debit_note: Money,
    pub net_payable: Money,
    /// `None` when no payment has been recorded.
    pub paid: Option<Money>,
}

impl PaymentFigures {
    /// Parses the figures from text, as typed by an operator.
    ///
    /// Parsing errors name the GRN column that failed.
    pub fn parse(
        gross: &str,
        debit_note: &str,
        net_payable: &str,
        paid: Option<&str>,
    ) -> Result<Self, AmountError> {
        Ok(PaymentFigures {
            gross: Money::parse("gross_amount", gross)?,
            debit_note: Money::parse("debit_note_amount", debit_note)?,
            net_payable: Money::parse("net_payable_amount", net_payable)?,
            paid: paid.map(|p| Money::parse("paid_amount", p)).transpose()?,
        })
    }
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of reconciling a GRN's payment figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReconciliation {
    /// `net_payable − paid`. Negative when overpaid.
    pub balance: Money,

    /// `paid ≥ net_payable`.
    pub should_be_paid: bool,

    pub status: PaymentStatus,

    /// `gross − debit_note`.
    pub expected_net_payable: Money,

    /// Stored net payable equals `gross − debit_note`.
    pub net_payable_consistent: bool,

    pub overpaid: bool,
}

/// Reconciles a GRN's payment figures.
///
/// ## Errors
/// [`AmountError::Negative`] for the first negative field, checked in
/// column order: gross, debit note, net payable, paid.
pub fn reconcile_payment(figures: &PaymentFigures) -> Result<PaymentReconciliation, AmountError> {
    let gross = figures.gross.ensure_non_negative("gross_amount")?;
    let debit_note = figures.debit_note.ensure_non_negative("debit_note_amount")?;
    let net_payable = figures.net_payable.ensure_non_negative("net_payable_amount")?;
    let paid = figures
        .paid
        .unwrap_or_default()
        .ensure_non_negative("paid_amount")?;

    // Both sides are non-negative i64, so neither subtraction can overflow.
    let balance = net_payable - paid;
    let expected_net_payable = gross - debit_note;

    Ok(PaymentReconciliation {
        balance,
        should_be_paid: paid >= net_payable,
        status: PaymentStatus::derive(paid, net_payable),
        expected_net_payable,
        net_payable_consistent: expected_net_payable == net_payable,
        overpaid: balance.is_negative(),
    })
}

// =============================================================================
// Debit Note Check
// =============================================================================

/// Cross-check of the GRN's debit note against its rejected lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitNoteCheck {
    /// Debit note amount stored on the GRN.
    pub recorded: Money,

    /// Sum of the lines' stored rejection amounts.
    pub line_total: Money,

    pub consistent: bool,

    /// Line ids whose rejection amount is not `rejected_qty × rate`.
    pub mispriced_lines: Vec<String>,
}

/// Compares the recorded debit note with the rejection amounts on the lines.
///
/// ## Errors
/// - [`AmountError::Negative`] for a negative debit note, rate or
///   rejection amount
/// - [`AmountError::OutOfRange`] when `rejected_qty × rate` or the running
///   total overflows
pub fn check_debit_note(
    debit_note: Money,
    lines: &[GrnLineItem],
) -> Result<DebitNoteCheck, AmountError> {
    let recorded = debit_note.ensure_non_negative("debit_note_amount")?;

    let mut line_total = Money::zero();
    let mut mispriced_lines = Vec::new();

    for line in lines {
        let rate = line.rate().ensure_non_negative("rate")?;
        let rejection = line
            .rejection_amount()
            .ensure_non_negative("rejection_amount")?;

        let expected = rate
            .checked_times(line.rejected_qty)
            .ok_or_else(|| AmountError::OutOfRange {
                field: "rejection_amount".to_string(),
                value: format!("{} x {}", line.rejected_qty, rate),
            })?;
        if expected != rejection {
            mispriced_lines.push(line.id.clone());
        }

        line_total = line_total
            .checked_add(rejection)
            .ok_or_else(|| AmountError::OutOfRange {
                field: "debit_note_amount".to_string(),
                value: line.id.clone(),
            })?;
    }

    Ok(DebitNoteCheck {
        recorded,
        line_total,
        consistent: recorded == line_total && mispriced_lines.is_empty(),
        mispriced_lines,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
