//! Money helpers with decimal precision and integer-cent storage.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All monetary math rounds half-away-from-zero to 2 decimals, and sums are
//! accumulated in integer cents where precision matters.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Two monetary amounts closer than this are considered settled.
const SETTLEMENT_TOLERANCE_CENTS: i64 = 1;

/// Rounds a monetary amount to 2 decimal places, half away from zero.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a decimal amount to integer cents.
///
/// The amount is rounded to 2 decimal places first, so `to_cents` and
/// `from_cents` round-trip for any valid monetary value.
#[must_use]
pub fn to_cents(amount: Decimal) -> i64 {
    (round2(amount) * Decimal::ONE_HUNDRED).to_i64().unwrap_or(0)
}

/// Converts integer cents back to a decimal amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Returns true if a remaining balance is close enough to zero to be
/// considered fully settled (|remaining| < $0.01).
#[must_use]
pub fn is_settled(remaining: Decimal) -> bool {
    to_cents(remaining).abs() < SETTLEMENT_TOLERANCE_CENTS
}

/// Converts a 4-decimal value (quantities, tax rates) to fixed-point storage.
#[must_use]
pub fn to_fixed4(value: Decimal) -> i64 {
    (value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::new(10_000, 0))
    .to_i64()
    .unwrap_or(0)
}

/// Converts fixed-point storage back to a 4-decimal value.
#[must_use]
pub fn from_fixed4(fixed: i64) -> Decimal {
    Decimal::new(fixed, 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(49.165), dec!(49.17))]
    #[case(dec!(49.164), dec!(49.16))]
    #[case(dec!(-49.165), dec!(-49.17))]
    #[case(dec!(2.5), dec!(2.5))]
    #[case(dec!(0.005), dec!(0.01))]
    #[case(dec!(-0.005), dec!(-0.01))]
    fn test_round2_half_away_from_zero(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round2(input), expected);
    }

    #[test]
    fn test_cents_round_trip() {
        assert_eq!(to_cents(dec!(550.00)), 55_000);
        assert_eq!(from_cents(55_000), dec!(550.00));
        assert_eq!(to_cents(dec!(-1000)), -100_000);
        assert_eq!(from_cents(-100_000), dec!(-1000.00));
    }

    #[test]
    fn test_to_cents_rounds_first() {
        assert_eq!(to_cents(dec!(68.8333)), 6_883);
        assert_eq!(to_cents(dec!(49.1666)), 4_917);
    }

    #[test]
    fn test_fixed4_round_trip() {
        assert_eq!(to_fixed4(dec!(7)), 70_000);
        assert_eq!(from_fixed4(70_000), dec!(7.0000));
        assert_eq!(to_fixed4(dec!(2.5)), 25_000);
        assert_eq!(to_fixed4(dec!(0.00005)), 1);
    }

    #[test]
    fn test_is_settled() {
        assert!(is_settled(Decimal::ZERO));
        assert!(is_settled(dec!(0.004)));
        assert!(is_settled(dec!(-0.004)));
        assert!(!is_settled(dec!(0.01)));
        assert!(!is_settled(dec!(-0.01)));
        assert!(!is_settled(dec!(5)));
    }
}
