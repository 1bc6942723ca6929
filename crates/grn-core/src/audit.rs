//! # UID Audit
//!
//! Decides whether unit identifiers were generated for a GRN.
//!
//! One UID is expected per accepted unit, so the expected count is the
//! accepted quantity summed over the GRN's lines. Only a GRN with positive
//! accepted quantity and **zero** UIDs is a defect; short or excess counts
//! are reported but left to a human.

use serde::{Deserialize, Serialize};

/// Classification of a GRN's UID count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UidAuditStatus {
    /// Nothing accepted, nothing expected.
    NothingAccepted,
    /// UID count equals accepted quantity.
    Complete,
    /// Accepted quantity is positive but no UID exists.
    Missing,
    /// Some UIDs exist, fewer than accepted.
    Short,
    /// More UIDs than accepted units.
    Excess,
}

/// Result of auditing one GRN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidAudit {
    pub grn_id: String,
    pub accepted_total: i64,
    pub uid_count: i64,
    pub status: UidAuditStatus,
}

impl UidAudit {
    /// Classifies a GRN from its accepted total and UID count.
    ///
    /// ## Example
    /// ```rust
    /// use grn_core::audit::{UidAudit, UidAuditStatus};
    ///
    /// let audit = UidAudit::evaluate("grn-1", 12, 0);
    /// assert_eq!(audit.status, UidAuditStatus::Missing);
    /// assert!(audit.is_defect());
    /// ```
    pub fn evaluate(grn_id: impl Into<String>, accepted_total: i64, uid_count: i64) -> Self {
        let status = if accepted_total <= 0 {
            if uid_count > 0 {
                UidAuditStatus::Excess
            } else {
                UidAuditStatus::NothingAccepted
            }
        } else if uid_count == 0 {
            UidAuditStatus::Missing
        } else if uid_count < accepted_total {
            UidAuditStatus::Short
        } else if uid_count > accepted_total {
            UidAuditStatus::Excess
        } else {
            UidAuditStatus::Complete
        };

        UidAudit {
            grn_id: grn_id.into(),
            accepted_total,
            uid_count,
            status,
        }
    }

    /// Whether the GRN has accepted stock but no UIDs at all.
    #[inline]
    pub fn is_defect(&self) -> bool {
        self.status == UidAuditStatus::Missing
    }

    /// Units still without a UID (zero when complete or in excess).
    pub fn shortfall(&self) -> i64 {
        (self.accepted_total - self.uid_count).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_uids_with_accepted_stock_is_defect() {
        let audit = UidAudit::evaluate("g", 5, 0);
        assert_eq!(audit.status, UidAuditStatus::Missing);
        assert!(audit.is_defect());
        assert_eq!(audit.shortfall(), 5);
    }

    #[test]
    fn test_only_missing_is_a_defect() {
        let cases = [
            (0, 0, UidAuditStatus::NothingAccepted),
            (5, 5, UidAuditStatus::Complete),
            (5, 3, UidAuditStatus::Short),
            (5, 6, UidAuditStatus::Excess),
            (0, 2, UidAuditStatus::Excess),
        ];
        for (accepted, count, expected) in cases {
            let audit = UidAudit::evaluate("g", accepted, count);
            assert_eq!(audit.status, expected, "accepted={accepted} count={count}");
            assert!(!audit.is_defect());
        }
    }

    #[test]
    fn test_shortfall() {
        assert_eq!(UidAudit::evaluate("g", 5, 3).shortfall(), 2);
        assert_eq!(UidAudit::evaluate("g", 5, 8).shortfall(), 0);
    }
}
