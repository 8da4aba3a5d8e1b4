//! Coercion of raw user entries into calculator inputs.
//!
//! Every numeric field carries a documented default and a magnitude limit.
//! Anything that cannot be read as a number, or lies outside the limit, is
//! replaced by the field default and logged; it never reaches a formula.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::warn;

/// Upper bound on head counts and opportunity counts.
pub const COUNT_LIMIT: Decimal = dec!(1000000000);
/// Upper bound on money amounts.
pub const MONEY_LIMIT: Decimal = dec!(1000000000000);
/// Upper bound on percentages.
pub const PERCENT_LIMIT: Decimal = dec!(10000);
/// Upper bound on durations expressed in days.
pub const DAYS_LIMIT: Decimal = dec!(1000000);
/// Upper bound on durations expressed in months.
pub const MONTHS_LIMIT: Decimal = dec!(10000);

/// Errors raised while applying an edit to a calculator input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    /// The calculator has no field with this key.
    #[error("unknown field '{0}'")]
    UnknownField(String),
}

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid decimal '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Static description of one numeric input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key used in persisted JSON, CSV headers and `set_field`.
    pub key: &'static str,
    /// Label shown next to the field and used in CSV exports.
    pub label: &'static str,
    /// Largest accepted magnitude.
    pub limit: Decimal,
}

impl FieldSpec {
    pub const fn new(
        key: &'static str,
        label: &'static str,
        limit: Decimal,
    ) -> Self {
        Self { key, label, limit }
    }
}

/// Strips whitespace, thousands separators and currency/percent decorations.
fn normalize_decimal_input(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`) and ignores `$`
/// and `%`. Empty or whitespace-only input yields `Ok(None)`.
pub fn parse_decimal(s: &str) -> Result<Option<Decimal>, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(None);
    }
    normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map(Some)
        .map_err(|source| ParseDecimalError {
            input: s.to_string(),
            source,
        })
}

/// Replaces a value outside the field's limit with `default`.
pub fn within_limit(
    field: &FieldSpec,
    value: Decimal,
    default: Decimal,
) -> Decimal {
    if value.abs() > field.limit {
        warn!(
            field = field.key,
            %value,
            limit = %field.limit,
            "value out of range, using default"
        );
        default
    } else {
        value
    }
}

/// Turns a raw entry into a usable field value.
///
/// Empty and unparseable entries both fall back to `default`.
pub fn coerce_decimal(
    field: &FieldSpec,
    raw: &str,
    default: Decimal,
) -> Decimal {
    match parse_decimal(raw) {
        Ok(Some(value)) => within_limit(field, value, default),
        Ok(None) => default,
        Err(error) => {
            warn!(field = field.key, %error, "invalid numeric entry, using default");
            default
        }
    }
}
