//! Rule of 40: revenue growth rate plus profit margin.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::{Calculator, CalculatorInput, Classification, Outcome, OutcomeOf, Row};
use crate::format::{format_percent, format_plain};
use crate::input::{FieldSpec, InputError, PERCENT_LIMIT, coerce_decimal, within_limit};
use crate::models::{CalculatorId, FormId};

const GROWTH_RATE: FieldSpec =
    FieldSpec::new("growth_rate", "Revenue Growth Rate (%)", PERCENT_LIMIT);
const PROFIT_MARGIN: FieldSpec = FieldSpec::new("profit_margin", "Profit Margin (%)", PERCENT_LIMIT);

const FIELDS: &[FieldSpec] = &[GROWTH_RATE, PROFIT_MARGIN];

pub const RULE_OF_40_THRESHOLD: Decimal = dec!(40);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOf40Input {
    pub growth_rate: Decimal,
    /// EBITDA or free-cash-flow margin, percent.
    pub profit_margin: Decimal,
}

impl Default for RuleOf40Input {
    fn default() -> Self {
        Self {
            growth_rate: dec!(30),
            profit_margin: dec!(15),
        }
    }
}

impl CalculatorInput for RuleOf40Input {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            growth_rate: within_limit(&GROWTH_RATE, self.growth_rate, defaults.growth_rate),
            profit_margin: within_limit(&PROFIT_MARGIN, self.profit_margin, defaults.profit_margin),
        }
    }

    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let defaults = Self::default();
        match key {
            "growth_rate" => {
                self.growth_rate = coerce_decimal(&GROWTH_RATE, raw, defaults.growth_rate)
            }
            "profit_margin" => {
                self.profit_margin = coerce_decimal(&PROFIT_MARGIN, raw, defaults.profit_margin)
            }
            other => return Err(InputError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        vec![
            (GROWTH_RATE.label, format_percent(self.growth_rate)),
            (PROFIT_MARGIN.label, format_percent(self.profit_margin)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOf40Metrics {
    pub score: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOf40Status {
    /// Score at or above 40.
    Efficient,
    BurnProblem,
}

impl RuleOf40Status {
    pub fn from_score(score: Decimal) -> Self {
        if score >= RULE_OF_40_THRESHOLD {
            Self::Efficient
        } else {
            Self::BurnProblem
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Efficient => "Valuation Premium likely.",
            Self::BurnProblem => "Efficiency drag on valuation.",
        }
    }
}

impl Classification for RuleOf40Status {
    fn label(&self) -> &'static str {
        match self {
            Self::Efficient => "Distressed / Efficient",
            Self::BurnProblem => "Burn Problem",
        }
    }
}

/// Rule of 40 calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleOf40Calculator;

impl Calculator for RuleOf40Calculator {
    type Input = RuleOf40Input;
    type Metrics = RuleOf40Metrics;
    type Classification = RuleOf40Status;

    fn id(&self) -> CalculatorId {
        CalculatorId::RuleOf40
    }

    fn compute(
        &self,
        input: &RuleOf40Input,
    ) -> OutcomeOf<Self> {
        let input = input.clone().sanitized();
        let score = input.growth_rate + input.profit_margin;
        Outcome {
            metrics: RuleOf40Metrics { score },
            classification: RuleOf40Status::from_score(score),
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!("Rule of 40 Score: {}", format_plain(outcome.metrics.score))
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        vec![
            ("Rule of 40 Score", format_plain(outcome.metrics.score)),
            ("Assessment", outcome.classification.label().to_string()),
            ("Outlook", outcome.classification.description().to_string()),
        ]
    }

    fn form_id(&self) -> Option<FormId> {
        Some(FormId::RuleOf40)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn compute_negative_growth_is_burn_problem() {
        let outcome = RuleOf40Calculator.compute(&RuleOf40Input {
            growth_rate: dec!(-20),
            profit_margin: dec!(50),
        });

        assert_eq!(outcome.metrics.score, dec!(30));
        assert_eq!(outcome.classification, RuleOf40Status::BurnProblem);
        assert_eq!(outcome.classification.label(), "Burn Problem");
    }

    #[test]
    fn compute_threshold_is_inclusive() {
        let outcome = RuleOf40Calculator.compute(&RuleOf40Input {
            growth_rate: dec!(25),
            profit_margin: dec!(15),
        });

        assert_eq!(outcome.classification, RuleOf40Status::Efficient);
        assert_eq!(outcome.classification.description(), "Valuation Premium likely.");
    }

    #[test]
    fn compute_just_below_threshold() {
        assert_eq!(
            RuleOf40Status::from_score(dec!(39.99)),
            RuleOf40Status::BurnProblem
        );
    }

    #[test]
    fn summary_keeps_fractional_scores() {
        let outcome = RuleOf40Calculator.compute(&RuleOf40Input {
            growth_rate: dec!(30.5),
            profit_margin: dec!(15),
        });

        assert_eq!(RuleOf40Calculator.summary(&outcome), "Rule of 40 Score: 45.5");
    }
}
