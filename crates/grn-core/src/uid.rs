//! # UID Codes
//!
//! Generation and parsing of unit identifiers.
//!
//! ## Format
//! ```text
//! UID-SAIF-KOL-RM-000042-NC
//!     ──── ─── ── ────── ──
//!      │    │   │    │    └── checksum (2 chars, base-36)
//!      │    │   │    └─────── sequence, zero-padded to at least 6
//!      │    │   └──────────── entity type (RM / CP / FG / SA)
//!      │    └──────────────── plant code
//!      └───────────────────── tenant code
//! ```
//!
//! The sequence is per prefix (`UID-{TENANT}-{PLANT}-{TYPE}-`). Past
//! 999999 the field simply grows to 7+ digits, so codes under one prefix
//! order numerically by `(length, code)`, not by code alone.

use crate::types::EntityType;

/// Minimum width of the zero-padded sequence field.
pub const SEQUENCE_WIDTH: usize = 6;

/// Computes the two-character checksum over `input`.
///
/// 32-bit rolling hash `h = h * 31 + unit` over UTF-16 code units with
/// wrapping arithmetic, then the absolute value in upper-case base 36,
/// truncated to two characters and right-padded with `0`.
///
/// ## Example
/// ```rust
/// use grn_core::uid::checksum;
///
/// assert_eq!(checksum("SAIFKOLRM000001"), "9T");
/// assert_eq!(checksum(""), "00");
/// ```
pub fn checksum(input: &str) -> String {
    let hash = input
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));

    let mut digits = to_base36((hash as i64).unsigned_abs());
    digits.truncate(2);
    while digits.len() < 2 {
        digits.push('0');
    }
    digits
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    // Only ASCII digits were pushed.
    String::from_utf8(out).unwrap_or_default()
}

/// Issues consecutive UID codes for one tenant / plant / entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidSequence {
    tenant_code: String,
    plant_code: String,
    entity_type: EntityType,
    /// `None` once `u64` is exhausted.
    next: Option<u64>,
}

impl UidSequence {
    /// Starts a sequence right after `last_issued` (0 when none).
    pub fn after(
        tenant_code: impl Into<String>,
        plant_code: impl Into<String>,
        entity_type: EntityType,
        last_issued: u64,
    ) -> Self {
        UidSequence {
            tenant_code: tenant_code.into(),
            plant_code: plant_code.into(),
            entity_type,
            next: last_issued.checked_add(1),
        }
    }

    /// The `UID-{TENANT}-{PLANT}-{TYPE}-` prefix shared by this sequence.
    pub fn prefix(&self) -> String {
        prefix(&self.tenant_code, &self.plant_code, self.entity_type)
    }

    /// Returns the next code and advances the sequence, or `None` when no
    /// sequence number is left.
    pub fn next_code(&mut self) -> Option<String> {
        let current = self.next?;
        self.next = current.checked_add(1);

        let seq = format!("{:0width$}", current, width = SEQUENCE_WIDTH);
        let check = checksum(&format!(
            "{}{}{}{}",
            self.tenant_code,
            self.plant_code,
            self.entity_type.code(),
            seq
        ));
        Some(format!("{}{}-{}", self.prefix(), seq, check))
    }
}

/// Builds the `UID-{TENANT}-{PLANT}-{TYPE}-` prefix.
pub fn prefix(tenant_code: &str, plant_code: &str, entity_type: EntityType) -> String {
    format!("UID-{}-{}-{}-", tenant_code, plant_code, entity_type.code())
}

/// Extracts the sequence number from a UID code.
///
/// ## Example
/// ```rust
/// use grn_core::uid::parse_sequence;
///
/// assert_eq!(parse_sequence("UID-SAIF-KOL-RM-000042-NC"), Some(42));
/// assert_eq!(parse_sequence("SAIF-MFG-RM-20251101-0001"), None);
/// ```
pub fn parse_sequence(uid: &str) -> Option<u64> {
    let parts: Vec<&str> = uid.split('-').collect();
    match parts.as_slice() {
        ["UID", _, _, _, seq, check] if check.len() == 2 && seq.bytes().all(|b| b.is_ascii_digit()) => {
            seq.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_values() {
        assert_eq!(checksum("SAIFKOLRM000001"), "9T");
        assert_eq!(checksum("SAIFKOLCP000042"), "NC");
        assert_eq!(checksum("A"), "1T");
        assert_eq!(checksum(""), "00");
    }

    #[test]
    fn test_sequence_issues_consecutive_codes() {
        let mut seq = UidSequence::after("SAIF", "KOL", EntityType::RawMaterial, 0);
        assert_eq!(seq.prefix(), "UID-SAIF-KOL-RM-");
        assert_eq!(seq.next_code().unwrap(), "UID-SAIF-KOL-RM-000001-9T");
        let second = seq.next_code().unwrap();
        assert!(second.starts_with("UID-SAIF-KOL-RM-000002-"));
    }

    #[test]
    fn test_sequence_resumes_after_last_issued() {
        let mut seq = UidSequence::after("SAIF", "KOL", EntityType::Component, 41);
        assert_eq!(seq.next_code().unwrap(), "UID-SAIF-KOL-CP-000042-NC");
    }

    #[test]
    fn test_parse_sequence_round_trips_generated_code() {
        let mut seq = UidSequence::after("ACME", "PUN", EntityType::FinishedGood, 998);
        let code = seq.next_code().unwrap();
        assert_eq!(parse_sequence(&code), Some(999));
    }

    #[test]
    fn test_sequence_widens_past_six_digits() {
        let mut seq = UidSequence::after("SAIF", "KOL", EntityType::RawMaterial, 999_999);
        let code = seq.next_code().unwrap();
        assert!(code.starts_with("UID-SAIF-KOL-RM-1000000-"), "{code}");
        assert_eq!(parse_sequence(&code), Some(1_000_000));
        assert_eq!(parse_sequence("UID-SAIF-KOL-RM-4294967296-XX"), Some(4_294_967_296));
    }

    #[test]
    fn test_sequence_stops_at_u64_max() {
        let mut seq = UidSequence::after("SAIF", "KOL", EntityType::RawMaterial, u64::MAX - 1);
        assert!(seq.next_code().unwrap().contains(&u64::MAX.to_string()));
        assert_eq!(seq.next_code(), None);

        let mut exhausted = UidSequence::after("SAIF", "KOL", EntityType::RawMaterial, u64::MAX);
        assert_eq!(exhausted.next_code(), None);
    }

    #[test]
    fn test_parse_sequence_rejects_foreign_formats() {
        assert_eq!(parse_sequence(""), None);
        assert_eq!(parse_sequence("UID-SAIF-KOL-RM-abc-XX"), None);
        assert_eq!(parse_sequence("UID-SAIF-KOL-RM-000001"), None);
        assert_eq!(parse_sequence("UID-SAIF-KOL-RM-+12-XX"), None);
    }
}
