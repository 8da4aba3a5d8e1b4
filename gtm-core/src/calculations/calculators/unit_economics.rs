//! SaaS unit economics ("The SaaS Compass").
//!
//! | Metric                 | Formula                                             |
//! |------------------------|-----------------------------------------------------|
//! | LTV                    | `arpa × gross_margin/100 / max(churn_rate/100, 0.01)` |
//! | LTV:CAC                | `ltv / cac`                                         |
//! | Monthly gross profit   | `arpa/12 × gross_margin/100`                        |
//! | Payback (months)       | `cac / monthly_gross_profit`                        |
//!
//! Churn is floored at 1% so LTV stays finite. LTV:CAC and payback divide by
//! raw user input and are `None` when undefined.
//!
//! # Health
//!
//! Healthy is checked first (`ltv_cac > 3` and `payback < 12`), then danger
//! (`ltv_cac < 1.5` or `payback > 18`), otherwise neutral. An undefined ratio
//! satisfies no comparison.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{exceeds, falls_below, max, ratio, round_whole};
use crate::calculations::{
    Calculator, CalculatorInput, Classification, Outcome, OutcomeOf, Row,
};
use crate::format::{
    format_currency, format_months, format_optional_one_decimal, format_percent, format_ratio,
};
use crate::input::{FieldSpec, InputError, MONEY_LIMIT, PERCENT_LIMIT, coerce_decimal, within_limit};
use crate::models::{CalculatorId, FormId};

const CAC: FieldSpec = FieldSpec::new("cac", "CAC ($)", MONEY_LIMIT);
const ARPA: FieldSpec = FieldSpec::new("arpa", "ARPA ($)", MONEY_LIMIT);
const GROSS_MARGIN: FieldSpec = FieldSpec::new("gross_margin", "Gross Margin (%)", PERCENT_LIMIT);
const CHURN_RATE: FieldSpec = FieldSpec::new("churn_rate", "Annual Churn (%)", PERCENT_LIMIT);

const FIELDS: &[FieldSpec] = &[CAC, ARPA, GROSS_MARGIN, CHURN_RATE];

const MIN_CHURN: Decimal = dec!(0.01);
const HEALTHY_LTV_CAC: Decimal = dec!(3);
const HEALTHY_PAYBACK_MONTHS: Decimal = dec!(12);
const DANGER_LTV_CAC: Decimal = dec!(1.5);
const DANGER_PAYBACK_MONTHS: Decimal = dec!(18);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaasCompassInput {
    /// Customer acquisition cost.
    pub cac: Decimal,
    /// Annualized revenue per account.
    pub arpa: Decimal,
    pub gross_margin: Decimal,
    /// Annual churn, percent.
    pub churn_rate: Decimal,
}

impl Default for SaasCompassInput {
    fn default() -> Self {
        Self {
            cac: dec!(15000),
            arpa: dec!(45000),
            gross_margin: dec!(80),
            churn_rate: dec!(15),
        }
    }
}

impl CalculatorInput for SaasCompassInput {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            cac: within_limit(&CAC, self.cac, defaults.cac),
            arpa: within_limit(&ARPA, self.arpa, defaults.arpa),
            gross_margin: within_limit(&GROSS_MARGIN, self.gross_margin, defaults.gross_margin),
            churn_rate: within_limit(&CHURN_RATE, self.churn_rate, defaults.churn_rate),
        }
    }

    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let defaults = Self::default();
        match key {
            "cac" => self.cac = coerce_decimal(&CAC, raw, defaults.cac),
            "arpa" => self.arpa = coerce_decimal(&ARPA, raw, defaults.arpa),
            "gross_margin" => {
                self.gross_margin = coerce_decimal(&GROSS_MARGIN, raw, defaults.gross_margin)
            }
            "churn_rate" => self.churn_rate = coerce_decimal(&CHURN_RATE, raw, defaults.churn_rate),
            other => return Err(InputError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        vec![
            (CAC.label, format_currency(self.cac)),
            (ARPA.label, format_currency(self.arpa)),
            (GROSS_MARGIN.label, format_percent(self.gross_margin)),
            (CHURN_RATE.label, format_percent(self.churn_rate)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaasCompassMetrics {
    /// Customer lifetime value, whole dollars.
    pub ltv: Decimal,
    pub ltv_cac: Option<Decimal>,
    pub monthly_gross_profit: Decimal,
    pub payback_months: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompassHealth {
    Healthy,
    Neutral,
    Danger,
}

impl CompassHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Neutral => "neutral",
            Self::Danger => "danger",
        }
    }

    fn classify(
        ltv_cac: Option<Decimal>,
        payback_months: Option<Decimal>,
    ) -> Self {
        if exceeds(ltv_cac, HEALTHY_LTV_CAC) && falls_below(payback_months, HEALTHY_PAYBACK_MONTHS)
        {
            Self::Healthy
        } else if falls_below(ltv_cac, DANGER_LTV_CAC)
            || exceeds(payback_months, DANGER_PAYBACK_MONTHS)
        {
            Self::Danger
        } else {
            Self::Neutral
        }
    }
}

impl Classification for CompassHealth {
    fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Growth Ready",
            Self::Neutral => "Stable",
            Self::Danger => "Burn Warning",
        }
    }
}

/// Unit economics calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaasCompassCalculator;

impl Calculator for SaasCompassCalculator {
    type Input = SaasCompassInput;
    type Metrics = SaasCompassMetrics;
    type Classification = CompassHealth;

    fn id(&self) -> CalculatorId {
        CalculatorId::SaasCompass
    }

    fn compute(
        &self,
        input: &SaasCompassInput,
    ) -> OutcomeOf<Self> {
        let input = input.clone().sanitized();
        let margin = input.gross_margin / dec!(100);
        let churn = max(input.churn_rate / dec!(100), MIN_CHURN);

        let ltv = input.arpa * margin / churn;
        let ltv_cac = ratio(ltv, input.cac);
        let monthly_gross_profit = input.arpa / dec!(12) * margin;
        let payback_months = ratio(input.cac, monthly_gross_profit);

        Outcome {
            metrics: SaasCompassMetrics {
                ltv: round_whole(ltv),
                ltv_cac,
                monthly_gross_profit,
                payback_months,
            },
            classification: CompassHealth::classify(ltv_cac, payback_months),
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!(
            "LTV:CAC {}, Payback: {}mo",
            format_optional_one_decimal(outcome.metrics.ltv_cac),
            format_optional_one_decimal(outcome.metrics.payback_months),
        )
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        let metrics = &outcome.metrics;
        vec![
            ("LTV", format_currency(metrics.ltv)),
            ("LTV:CAC", format_ratio(metrics.ltv_cac)),
            ("Monthly Gross Profit", format_currency(metrics.monthly_gross_profit)),
            ("Payback Period", format_months(metrics.payback_months)),
            ("Health", outcome.classification.label().to_string()),
        ]
    }

    fn form_id(&self) -> Option<FormId> {
        Some(FormId::SaasCompass)
    }
}
