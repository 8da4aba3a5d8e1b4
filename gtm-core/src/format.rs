//! Display formatting shared by summaries, metric rows and CSV export.
//!
//! Currency is always US dollars in whole units with comma thousands
//! separators, regardless of host locale.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::calculations::common::round_whole;

/// Placeholder shown for an undefined ratio.
pub const UNDEFINED: &str = "—";

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn signed_whole(value: Decimal) -> (bool, String) {
    let rounded = round_whole(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().normalize().to_string();
    (negative, group_thousands(&digits))
}

/// Formats a money amount as `$1,234` (or `-$1,234`).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use gtm_core::format::format_currency;
///
/// assert_eq!(format_currency(dec!(83333.33)), "$83,333");
/// assert_eq!(format_currency(dec!(-1700000)), "-$1,700,000");
/// ```
pub fn format_currency(value: Decimal) -> String {
    let (negative, digits) = signed_whole(value);
    if negative {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Formats a whole-number count with thousands separators.
pub fn format_count(value: Decimal) -> String {
    let (negative, digits) = signed_whole(value);
    if negative { format!("-{digits}") } else { digits }
}

/// Formats a percentage rounded to a whole number, e.g. `36%`.
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", format_count(value))
}

/// Formats a value with exactly one decimal place, e.g. `16.0`.
pub fn format_one_decimal(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(1);
    rounded.to_string()
}

/// Like [`format_one_decimal`], with [`UNDEFINED`] for `None`.
pub fn format_optional_one_decimal(value: Option<Decimal>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), format_one_decimal)
}

/// Formats a multiple such as LTV:CAC, e.g. `16.0x`.
pub fn format_ratio(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}x", format_one_decimal(v)),
        None => UNDEFINED.to_string(),
    }
}

/// Formats a month count with one decimal, e.g. `5.0mo`.
pub fn format_months(value: Option<Decimal>) -> String {
    match value {
        Some(v) => format!("{}mo", format_one_decimal(v)),
        None => UNDEFINED.to_string(),
    }
}

/// Formats an optional whole percentage.
pub fn format_optional_percent(value: Option<Decimal>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), format_percent)
}

/// Formats an input value without trailing zeros, e.g. `90` or `2.5`.
pub fn format_plain(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(dec!(11000000)), "$11,000,000");
        assert_eq!(format_currency(dec!(999)), "$999");
        assert_eq!(format_currency(dec!(1000)), "$1,000");
    }

    #[test]
    fn currency_rounds_to_whole_dollars() {
        assert_eq!(format_currency(dec!(1234.5)), "$1,235");
        assert_eq!(format_currency(dec!(0.49)), "$0");
    }

    #[test]
    fn currency_shows_negative_amounts_as_is() {
        assert_eq!(format_currency(dec!(-3975000)), "-$3,975,000");
    }

    #[test]
    fn currency_never_shows_negative_zero() {
        assert_eq!(format_currency(dec!(-0.2)), "$0");
    }

    #[test]
    fn percent_rounds_to_whole() {
        assert_eq!(format_percent(dec!(36.14)), "36%");
        assert_eq!(format_percent(dec!(-12.5)), "-13%");
    }

    #[test]
    fn one_decimal_pads_integers() {
        assert_eq!(format_one_decimal(dec!(16)), "16.0");
        assert_eq!(format_one_decimal(dec!(5.04)), "5.0");
        assert_eq!(format_one_decimal(dec!(2.25)), "2.3");
    }

    #[test]
    fn undefined_values_render_as_dash() {
        assert_eq!(format_ratio(None), "—");
        assert_eq!(format_months(None), "—");
        assert_eq!(format_optional_percent(None), "—");
    }

    #[test]
    fn ratio_and_months_carry_units() {
        assert_eq!(format_ratio(Some(dec!(16))), "16.0x");
        assert_eq!(format_months(Some(dec!(5))), "5.0mo");
    }

    #[test]
    fn plain_drops_trailing_zeros() {
        assert_eq!(format_plain(dec!(90.00)), "90");
        assert_eq!(format_plain(dec!(2.50)), "2.5");
    }
}
