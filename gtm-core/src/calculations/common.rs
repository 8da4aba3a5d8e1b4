//! Common arithmetic helpers for calculator formulas.
//!
//! This module provides the rounding and guarded-division operations shared by
//! the individual calculators.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to the nearest whole unit, halves away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use gtm_core::calculations::common::round_whole;
///
/// assert_eq!(round_whole(dec!(83333.33)), dec!(83333));
/// assert_eq!(round_whole(dec!(2.5)), dec!(3));
/// assert_eq!(round_whole(dec!(-2.5)), dec!(-3));
/// ```
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
///
/// Used to floor a denominator at a minimum before dividing.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use gtm_core::calculations::common::max;
///
/// assert_eq!(max(dec!(0.05), dec!(0.1)), dec!(0.1));
/// assert_eq!(max(dec!(3), dec!(0.1)), dec!(3));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Divides `numerator` by `denominator`, returning `None` when the quotient
/// is undefined (zero denominator) or does not fit in a [`Decimal`].
///
/// # Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use gtm_core::calculations::common::ratio;
///
/// assert_eq!(ratio(dec!(240000), dec!(15000)), Some(dec!(16)));
/// assert_eq!(ratio(dec!(1), Decimal::ZERO), None);
/// ```
pub fn ratio(
    numerator: Decimal,
    denominator: Decimal,
) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Compares an optional ratio against a threshold.
///
/// An undefined ratio never satisfies a comparison, in either direction.
pub fn exceeds(
    value: Option<Decimal>,
    threshold: Decimal,
) -> bool {
    value.is_some_and(|v| v > threshold)
}

/// See [`exceeds`]; the strict less-than counterpart.
pub fn falls_below(
    value: Option<Decimal>,
    threshold: Decimal,
) -> bool {
    value.is_some_and(|v| v < threshold)
}
