//! Pipeline velocity: expected revenue throughput per month.
//!
//! ```text
//! velocity = opportunities × deal_value × win_rate/100 / max(sales_cycle_days/30, 0.1)
//! ```
//!
//! The cycle length is floored at 0.1 months so a zero or negative cycle
//! never divides by zero. The result is rounded to whole dollars.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use gtm_core::calculations::{Calculator, VelocityCalculator, VelocityInput};
//!
//! let outcome = VelocityCalculator.compute(&VelocityInput::default());
//!
//! assert_eq!(outcome.metrics.velocity, dec!(83333));
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{max, round_whole};
use crate::calculations::{Calculator, CalculatorInput, Outcome, OutcomeOf, Row, Unclassified};
use crate::format::{format_count, format_currency, format_percent, format_plain};
use crate::input::{
    COUNT_LIMIT, DAYS_LIMIT, FieldSpec, InputError, MONEY_LIMIT, PERCENT_LIMIT, coerce_decimal,
    within_limit,
};
use crate::models::{CalculatorId, FormId};

const OPPORTUNITIES: FieldSpec = FieldSpec::new("opportunities", "Opportunities", COUNT_LIMIT);
const DEAL_VALUE: FieldSpec = FieldSpec::new("deal_value", "Deal Value ($)", MONEY_LIMIT);
const WIN_RATE: FieldSpec = FieldSpec::new("win_rate", "Win Rate (%)", PERCENT_LIMIT);
const SALES_CYCLE_DAYS: FieldSpec =
    FieldSpec::new("sales_cycle_days", "Cycle Length (Days)", DAYS_LIMIT);

const FIELDS: &[FieldSpec] = &[OPPORTUNITIES, DEAL_VALUE, WIN_RATE, SALES_CYCLE_DAYS];

/// Days per month used to convert the sales cycle.
const DAYS_PER_MONTH: Decimal = dec!(30);
/// Shortest effective sales cycle, in months.
const MIN_CYCLE_MONTHS: Decimal = dec!(0.1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityInput {
    pub opportunities: Decimal,
    pub deal_value: Decimal,
    /// Percent, e.g. `20` for 20%.
    pub win_rate: Decimal,
    pub sales_cycle_days: Decimal,
}

impl Default for VelocityInput {
    fn default() -> Self {
        Self {
            opportunities: dec!(50),
            deal_value: dec!(25000),
            win_rate: dec!(20),
            sales_cycle_days: dec!(90),
        }
    }
}

impl CalculatorInput for VelocityInput {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            opportunities: within_limit(&OPPORTUNITIES, self.opportunities, defaults.opportunities),
            deal_value: within_limit(&DEAL_VALUE, self.deal_value, defaults.deal_value),
            win_rate: within_limit(&WIN_RATE, self.win_rate, defaults.win_rate),
            sales_cycle_days: within_limit(
                &SALES_CYCLE_DAYS,
                self.sales_cycle_days,
                defaults.sales_cycle_days,
            ),
        }
    }

    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let defaults = Self::default();
        match key {
            "opportunities" => {
                self.opportunities = coerce_decimal(&OPPORTUNITIES, raw, defaults.opportunities)
            }
            "deal_value" => self.deal_value = coerce_decimal(&DEAL_VALUE, raw, defaults.deal_value),
            "win_rate" => self.win_rate = coerce_decimal(&WIN_RATE, raw, defaults.win_rate),
            "sales_cycle_days" => {
                self.sales_cycle_days =
                    coerce_decimal(&SALES_CYCLE_DAYS, raw, defaults.sales_cycle_days)
            }
            other => return Err(InputError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        vec![
            (OPPORTUNITIES.label, format_count(self.opportunities)),
            (DEAL_VALUE.label, format_currency(self.deal_value)),
            (WIN_RATE.label, format_percent(self.win_rate)),
            (SALES_CYCLE_DAYS.label, format_plain(self.sales_cycle_days)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VelocityMetrics {
    /// Expected closed revenue per month, whole dollars.
    pub velocity: Decimal,
}

/// Revenue velocity calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityCalculator;

impl Calculator for VelocityCalculator {
    type Input = VelocityInput;
    type Metrics = VelocityMetrics;
    type Classification = Unclassified;

    fn id(&self) -> CalculatorId {
        CalculatorId::PipelineVelocity
    }

    fn compute(
        &self,
        input: &VelocityInput,
    ) -> OutcomeOf<Self> {
        let input = input.clone().sanitized();
        let expected_revenue = input.opportunities * input.deal_value * input.win_rate / dec!(100);
        let cycle_months = max(input.sales_cycle_days / DAYS_PER_MONTH, MIN_CYCLE_MONTHS);

        Outcome {
            metrics: VelocityMetrics {
                velocity: round_whole(expected_revenue / cycle_months),
            },
            classification: Unclassified,
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!("Velocity: {}/mo", format_currency(outcome.metrics.velocity))
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        vec![(
            "Revenue Velocity ($/mo)",
            format_currency(outcome.metrics.velocity),
        )]
    }

    fn form_id(&self) -> Option<FormId> {
        Some(FormId::PipelineVelocity)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn input(
        opportunities: Decimal,
        deal_value: Decimal,
        win_rate: Decimal,
        sales_cycle_days: Decimal,
    ) -> VelocityInput {
        VelocityInput {
            opportunities,
            deal_value,
            win_rate,
            sales_cycle_days,
        }
    }

    // =========================================================================
    // compute tests
    // =========================================================================

    #[test]
    fn compute_reference_scenario() {
        let outcome = VelocityCalculator.compute(&input(dec!(50), dec!(25000), dec!(20), dec!(90)));

        assert_eq!(outcome.metrics.velocity, dec!(83333));
    }

    #[test]
    fn compute_floors_zero_cycle_at_a_tenth_of_a_month() {
        let outcome = VelocityCalculator.compute(&input(dec!(10), dec!(1000), dec!(50), dec!(0)));

        // 5,000 expected revenue over 0.1 months
        assert_eq!(outcome.metrics.velocity, dec!(50000));
    }

    #[test]
    fn compute_floors_negative_cycle() {
        let outcome =
            VelocityCalculator.compute(&input(dec!(10), dec!(1000), dec!(50), dec!(-30)));

        assert_eq!(outcome.metrics.velocity, dec!(50000));
    }

    #[test]
    fn compute_keeps_negative_revenue() {
        let outcome =
            VelocityCalculator.compute(&input(dec!(10), dec!(-1000), dec!(50), dec!(30)));

        assert_eq!(outcome.metrics.velocity, dec!(-5000));
    }

    #[test]
    fn compute_is_deterministic() {
        let value = input(dec!(37), dec!(12345.67), dec!(17.5), dec!(73));

        assert_eq!(
            VelocityCalculator.compute(&value),
            VelocityCalculator.compute(&value)
        );
    }

    #[test]
    fn compute_handles_limits_without_overflow() {
        let value = input(COUNT_LIMIT, MONEY_LIMIT, PERCENT_LIMIT, dec!(0));

        // Completes without panicking; magnitude is irrelevant.
        let _ = VelocityCalculator.compute(&value);
    }

    // =========================================================================
    // input tests
    // =========================================================================

    #[test]
    fn set_field_parses_decorated_money() {
        let mut value = VelocityInput::default();

        value.set_field("deal_value", "$40,000").unwrap();

        assert_eq!(value.deal_value, dec!(40000));
    }

    #[test]
    fn set_field_restores_default_for_garbage() {
        let mut value = input(dec!(1), dec!(1), dec!(1), dec!(1));

        value.set_field("win_rate", "twenty").unwrap();

        assert_eq!(value.win_rate, dec!(20));
    }

    #[test]
    fn set_field_rejects_unknown_key() {
        let mut value = VelocityInput::default();

        let result = value.set_field("quota", "1");

        assert_eq!(result, Err(InputError::UnknownField("quota".to_string())));
        assert_eq!(value, VelocityInput::default());
    }

    #[test]
    fn sanitized_replaces_out_of_range_values() {
        let value = input(dec!(50), dec!(25000), dec!(20000), dec!(90)).sanitized();

        assert_eq!(value.win_rate, dec!(20));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let value: VelocityInput = serde_json::from_str(r#"{"opportunities": 75}"#).unwrap();

        assert_eq!(value.opportunities, dec!(75));
        assert_eq!(value.deal_value, dec!(25000));
    }

    // =========================================================================
    // presentation tests
    // =========================================================================

    #[test]
    fn summary_embeds_monthly_velocity() {
        let outcome = VelocityCalculator.compute(&VelocityInput::default());

        assert_eq!(VelocityCalculator.summary(&outcome), "Velocity: $83,333/mo");
    }

    #[test]
    fn lead_fields_are_email_then_message() {
        let outcome = VelocityCalculator.compute(&VelocityInput::default());

        let fields = VelocityCalculator.lead_fields("vp@example.com", &outcome);

        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["email", "message"]);
    }
}
