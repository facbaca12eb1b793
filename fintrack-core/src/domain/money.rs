//! Conversion between decimal currency amounts and integer minor units
//!
//! Amounts are persisted as `i64` thousandths of the currency unit
//! ("mil units"), so `4.50` is stored as `4500`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of minor units per whole currency unit
pub const MINOR_UNITS_PER_UNIT: i64 = 1000;

/// Fraction digits carried by a minor-unit amount
const MINOR_UNIT_SCALE: u32 = 3;

/// Convert a decimal amount to integer minor units
///
/// Rounds half away from zero (`0.0005` becomes `1`, `-0.0005` becomes `-1`).
/// Amounts outside the `i64` range saturate.
pub fn to_minor_units(amount: Decimal) -> i64 {
    let saturated = if amount.is_sign_negative() { i64::MIN } else { i64::MAX };
    checked_to_minor_units(amount).unwrap_or(saturated)
}

/// Like [`to_minor_units`], but `None` when the result does not fit `i64`
pub fn checked_to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::from(MINOR_UNITS_PER_UNIT))
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
}

/// Convert integer minor units back to a decimal amount (exact)
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Format minor units as US dollars, e.g. `-$1,234.50`
pub fn format_currency(minor: i64) -> String {
    let value = from_minor_units(minor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = value.is_sign_negative() && !value.is_zero();
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec("4.50")), 4500);
        assert_eq!(to_minor_units(dec("-12.345")), -12345);
        assert_eq!(to_minor_units(dec("0")), 0);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(dec("0.0005")), 1);
        assert_eq!(to_minor_units(dec("-0.0005")), -1);
        assert_eq!(to_minor_units(dec("1.2344")), 1234);
    }

    #[test]
    fn test_saturates_out_of_range() {
        assert_eq!(to_minor_units(Decimal::MAX), i64::MAX);
        assert_eq!(to_minor_units(Decimal::MIN), i64::MIN);
    }

    #[test]
    fn test_checked_conversion_rejects_out_of_range() {
        assert_eq!(checked_to_minor_units(dec("4.5")), Some(4500));
        assert_eq!(checked_to_minor_units(dec("99999999999999999999")), None);
        assert_eq!(checked_to_minor_units(dec("-99999999999999999999")), None);
    }

    #[test]
    fn test_decimal_round_trip_with_three_fraction_digits() {
        for s in ["4.5", "-0.001", "1234567.891", "0.1", "-99.99"] {
            assert_eq!(from_minor_units(to_minor_units(dec(s))), dec(s), "{}", s);
        }
    }

    #[test]
    fn test_minor_unit_round_trip() {
        for x in [0, 1, -1, 4500, -123_456_789, i64::MAX, i64::MIN] {
            assert_eq!(to_minor_units(from_minor_units(x)), x);
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(4500), "$4.50");
        assert_eq!(format_currency(-1_234_500), "-$1,234.50");
        assert_eq!(format_currency(0), "$0.00");
        assert_eq!(format_currency(1_000_000_000), "$1,000,000.00");
        assert_eq!(format_currency(-4), "$0.00");
    }
}
