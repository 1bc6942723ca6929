//! # Money
//!
//! GRN amounts held as signed integer cents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "900.10" ──rust_decimal──► 900.10 ──×100──► Money(90010)              │
//! │                                                                         │
//! │  f64:    900.10 - 0.10 = 899.9999999999999                              │
//! │  cents:  90010  - 10   = 90000                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Signed because a balance goes below zero when a GRN is overpaid.
//!
//! ```rust
//! use grn_core::money::Money;
//!
//! let net_payable = Money::parse("net_payable_amount", "900.00").unwrap();
//! let paid = Money::from_cents(50_000);
//! assert_eq!((net_payable - paid).cents(), 40_000);
//! ```

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AmountError;

/// Cents (or paise). Serialises as the bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn zero() -> Self {
        Money(0)
    }

    /// Parses decimal text such as `"900.5"` or `" 1000 "`.
    ///
    /// Only plain decimal notation is accepted: an optional leading `-`,
    /// ASCII digits and at most one `.` with digits on both sides.
    /// Exponents (`1e3`), digit separators (`1_000`, `1,000`) and a leading
    /// `+` are `NotNumeric`.
    /// Trailing zeros past the second decimal are tolerated (`"1.500"`);
    /// a third significant decimal is not. The sign is kept: whether a
    /// negative figure is acceptable depends on the column, see
    /// [`Money::ensure_non_negative`].
    ///
    /// ```rust
    /// use grn_core::money::Money;
    ///
    /// assert_eq!(Money::parse("gross_amount", " 1000 ").unwrap().cents(), 100_000);
    /// assert!(Money::parse("gross_amount", "ten").is_err());
    /// ```
    pub fn parse(field: &str, raw: &str) -> Result<Money, AmountError> {
        let not_numeric = || AmountError::NotNumeric {
            field: field.to_string(),
            value: raw.to_string(),
        };

        let trimmed = raw.trim();
        if !is_plain_decimal(trimmed) {
            return Err(not_numeric());
        }
        let value = Decimal::from_str(trimmed).map_err(|_| not_numeric())?;

        if value.normalize().scale() > 2 {
            return Err(AmountError::TooPrecise {
                field: field.to_string(),
                value: raw.to_string(),
            });
        }

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
            .ok_or_else(|| AmountError::OutOfRange {
                field: field.to_string(),
                value: raw.to_string(),
            })
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `field` names the column in the resulting [`AmountError::Negative`].
    pub fn ensure_non_negative(self, field: &str) -> Result<Money, AmountError> {
        if self.is_negative() {
            return Err(AmountError::Negative {
                field: field.to_string(),
                cents: self.0,
            });
        }
        Ok(self)
    }

    /// `rate × qty`, `None` on overflow.
    ///
    /// ```rust
    /// use grn_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(2_500).checked_times(4).unwrap().cents(), 10_000);
    /// assert!(Money::from_cents(i64::MAX).checked_times(2).is_none());
    /// ```
    pub fn checked_times(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

/// `-?digits(.digits)?`. `Decimal::from_str` alone would also take `1e3`
/// and `1_000`.
fn is_plain_decimal(text: &str) -> bool {
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    let unsigned = text.strip_prefix('-').unwrap_or(text);
    match unsigned.split_once('.') {
        Some((whole, frac)) => all_digits(whole) && all_digits(frac),
        None => all_digits(unsigned),
    }
}

/// `900.50`, `-4.00`. No currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(90_050).to_string(), "900.50");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-7).to_string(), "-0.07");
        assert_eq!(Money::from_cents(-40_000).to_string(), "-400.00");
        assert_eq!(Money::zero().to_string(), "0.00");
        assert_eq!(Money::from_cents(i64::MIN).to_string(), "-92233720368547758.08");
    }

    #[test]
    fn parse_accepts_decimal_text() {
        assert_eq!(Money::parse("f", "900").unwrap().cents(), 90_000);
        assert_eq!(Money::parse("f", "900.5").unwrap().cents(), 90_050);
        assert_eq!(Money::parse("f", "  0.07 ").unwrap().cents(), 7);
        assert_eq!(Money::parse("f", "12.500").unwrap().cents(), 1_250);
        assert_eq!(Money::parse("f", "-3.25").unwrap().cents(), -325);
        assert_eq!(Money::parse("f", "0.5").unwrap().cents(), 50);
    }

    #[test]
    fn parse_rejects_non_numeric() {
        for raw in [
            "", "-", ".", "abc", "12,50", "1e3", "1E3", "2.5e-1", "1_000", "1.0.0", "+5", "--5",
            "NaN", "- 5", ".5", "7.",
        ] {
            let err = Money::parse("gross_amount", raw).unwrap_err();
            assert!(
                matches!(err, AmountError::NotNumeric { .. }),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_third_decimal() {
        let err = Money::parse("paid_amount", "10.005").unwrap_err();
        assert_eq!(
            err,
            AmountError::TooPrecise {
                field: "paid_amount".to_string(),
                value: "10.005".to_string(),
            }
        );
    }

    #[test]
    fn parse_rejects_out_of_range() {
        let err = Money::parse("gross_amount", "99999999999999999999").unwrap_err();
        assert!(matches!(err, AmountError::OutOfRange { .. }));
    }

    #[test]
    fn negative_is_reported_with_field() {
        assert!(Money::zero().ensure_non_negative("paid_amount").is_ok());
        let err = Money::from_cents(-1)
            .ensure_non_negative("paid_amount")
            .unwrap_err();
        assert_eq!(
            err,
            AmountError::Negative {
                field: "paid_amount".to_string(),
                cents: -1,
            }
        );
    }

    #[test]
    fn serialises_as_integer() {
        assert_eq!(serde_json::to_string(&Money::from_cents(1250)).unwrap(), "1250");
        let back: Money = serde_json::from_str("-40").unwrap();
        assert_eq!(back.cents(), -40);
    }
}
