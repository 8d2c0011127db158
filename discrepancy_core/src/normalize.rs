//! Name canonicalization for exact-match comparison.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::NameKey;

/// Canonical form of a name part.
///
/// Steps:
/// 1. Convert to uppercase
/// 2. Strip hyphens and underscores
/// 3. Strip all whitespace
///
/// Returns empty string for empty input.
pub fn normalize_name(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '_') && !c.is_whitespace())
        .collect()
}

/// Composite lookup key of a last and first name.
pub fn name_key(last: &str, first: &str) -> NameKey {
    NameKey::new(last, first)
}

/// Rounds a money amount to cents, halves away from zero.
pub(crate) fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_separators() {
        assert_eq!(normalize_name("Smith-Jones"), "SMITHJONES");
        assert_eq!(normalize_name("mary_ann"), "MARYANN");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_name("  Van  der\tBerg "), "VANDERBERG");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_normalize_keeps_other_punctuation() {
        assert_eq!(normalize_name("O'Brien Jr."), "O'BRIENJR.");
        assert_eq!(normalize_name("A|B"), "A|B");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_name(" de la-Cruz_ ");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn test_name_key() {
        assert_eq!(name_key("smith", " john ").to_string(), "SMITH|JOHN");
    }

    #[test]
    fn test_round_cents_half_away_from_zero() {
        assert_eq!(round_cents(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_cents(Decimal::new(-12345, 3)), Decimal::new(-1235, 2));
        assert_eq!(round_cents(Decimal::new(1, 0)), Decimal::new(1, 0));
    }
}
