//! Revenue leakage: fixed heuristic shares of ARR lost to pipeline slippage,
//! handoff friction and wasted effort.
//!
//! Growth rate, sales cycle and win rate are collected and persisted with the
//! rest of the input but do not enter the formula.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_whole;
use crate::calculations::{Calculator, CalculatorInput, Outcome, OutcomeOf, Row, Unclassified};
use crate::format::{format_currency, format_percent, format_plain};
use crate::input::{
    DAYS_LIMIT, FieldSpec, InputError, MONEY_LIMIT, PERCENT_LIMIT, coerce_decimal, within_limit,
};
use crate::models::{CalculatorId, FormId};

const ARR: FieldSpec = FieldSpec::new("arr", "Current ARR ($)", MONEY_LIMIT);
const GROWTH_RATE: FieldSpec = FieldSpec::new("growth_rate", "Growth Rate (%)", PERCENT_LIMIT);
const SALES_CYCLE_DAYS: FieldSpec =
    FieldSpec::new("sales_cycle_days", "Sales Cycle (Days)", DAYS_LIMIT);
const WIN_RATE: FieldSpec = FieldSpec::new("win_rate", "Win Rate (%)", PERCENT_LIMIT);

const FIELDS: &[FieldSpec] = &[ARR, GROWTH_RATE, SALES_CYCLE_DAYS, WIN_RATE];

pub const SLIPPAGE_RATE: Decimal = dec!(0.08);
pub const HANDOFF_RATE: Decimal = dec!(0.05);
pub const WASTE_RATE: Decimal = dec!(0.04);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeakageInput {
    pub arr: Decimal,
    pub growth_rate: Decimal,
    pub sales_cycle_days: Decimal,
    pub win_rate: Decimal,
}

impl Default for LeakageInput {
    fn default() -> Self {
        Self {
            arr: dec!(10000000),
            growth_rate: dec!(30),
            sales_cycle_days: dec!(90),
            win_rate: dec!(20),
        }
    }
}

impl CalculatorInput for LeakageInput {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            arr: within_limit(&ARR, self.arr, defaults.arr),
            growth_rate: within_limit(&GROWTH_RATE, self.growth_rate, defaults.growth_rate),
            sales_cycle_days: within_limit(
                &SALES_CYCLE_DAYS,
                self.sales_cycle_days,
                defaults.sales_cycle_days,
            ),
            win_rate: within_limit(&WIN_RATE, self.win_rate, defaults.win_rate),
        }
    }

    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let defaults = Self::default();
        match key {
            "arr" => self.arr = coerce_decimal(&ARR, raw, defaults.arr),
            "growth_rate" => {
                self.growth_rate = coerce_decimal(&GROWTH_RATE, raw, defaults.growth_rate)
            }
            "sales_cycle_days" => {
                self.sales_cycle_days =
                    coerce_decimal(&SALES_CYCLE_DAYS, raw, defaults.sales_cycle_days)
            }
            "win_rate" => self.win_rate = coerce_decimal(&WIN_RATE, raw, defaults.win_rate),
            other => return Err(InputError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        vec![
            (ARR.label, format_currency(self.arr)),
            (GROWTH_RATE.label, format_percent(self.growth_rate)),
            (SALES_CYCLE_DAYS.label, format_plain(self.sales_cycle_days)),
            (WIN_RATE.label, format_percent(self.win_rate)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakageMetrics {
    pub slippage: Decimal,
    pub handoff: Decimal,
    pub waste: Decimal,
    /// Annual leakage in whole dollars.
    pub total: Decimal,
    /// Combined leakage rate as a percentage of ARR.
    pub total_pct: Decimal,
}

/// Revenue leakage calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeakageCalculator;

impl Calculator for LeakageCalculator {
    type Input = LeakageInput;
    type Metrics = LeakageMetrics;
    type Classification = Unclassified;

    fn id(&self) -> CalculatorId {
        CalculatorId::RevenueLeakage
    }

    fn compute(
        &self,
        input: &LeakageInput,
    ) -> OutcomeOf<Self> {
        let input = input.clone().sanitized();
        let rate = SLIPPAGE_RATE + HANDOFF_RATE + WASTE_RATE;

        Outcome {
            metrics: LeakageMetrics {
                slippage: round_whole(input.arr * SLIPPAGE_RATE),
                handoff: round_whole(input.arr * HANDOFF_RATE),
                waste: round_whole(input.arr * WASTE_RATE),
                total: round_whole(input.arr * rate),
                total_pct: rate * dec!(100),
            },
            classification: Unclassified,
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!(
            "Revenue Leakage: {}/yr ({} of ARR)",
            format_currency(outcome.metrics.total),
            format_percent(outcome.metrics.total_pct),
        )
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        let metrics = &outcome.metrics;
        vec![
            ("Pipeline Slippage", format_currency(metrics.slippage)),
            ("Handoff Friction", format_currency(metrics.handoff)),
            ("Wasted Effort", format_currency(metrics.waste)),
            ("Total Leakage ($/yr)", format_currency(metrics.total)),
        ]
    }

    fn form_id(&self) -> Option<FormId> {
        Some(FormId::RevenueLeakage)
    }
}
