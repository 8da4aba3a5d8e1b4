//! Sales capacity planning ("The Quota Cliff"): spreadsheet versus street
//! capacity over a twelve month horizon.
//!
//! This is a heuristic, not a month-by-month cohort simulation. Spreadsheet
//! capacity assumes every rep carries full quota at the average headcount;
//! street capacity subtracts two flat drags:
//!
//! - **Ramp drag**: each hire loses `ramp_time_months × 0.6` productive
//!   rep-months, valued at `quota_per_rep / 12` per rep-month.
//! - **Attrition drag**: reps who leave during the year are assumed to
//!   miss half a year of quota.
//!
//! Negative gaps are valid results and are shown as-is.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{ratio, round_whole};
use crate::calculations::{Calculator, CalculatorInput, Outcome, OutcomeOf, Row, Unclassified};
use crate::format::{
    format_count, format_currency, format_optional_percent, format_percent, format_plain,
};
use crate::input::{
    COUNT_LIMIT, FieldSpec, InputError, MONEY_LIMIT, MONTHS_LIMIT, PERCENT_LIMIT, coerce_decimal,
    within_limit,
};
use crate::models::{CalculatorId, FormId};

const STARTING_REPS: FieldSpec =
    FieldSpec::new("starting_reps", "Starting Reps (Fully Ramped)", COUNT_LIMIT);
const QUOTA_PER_REP: FieldSpec = FieldSpec::new("quota_per_rep", "Annual Quota / Rep", MONEY_LIMIT);
const ATTRITION_RATE: FieldSpec =
    FieldSpec::new("attrition_rate", "Attrition Rate (%)", PERCENT_LIMIT);
const RAMP_TIME_MONTHS: FieldSpec =
    FieldSpec::new("ramp_time_months", "Ramp Time (Months)", MONTHS_LIMIT);
const HIRING_PLAN: FieldSpec = FieldSpec::new("hiring_plan", "Hires / Month", COUNT_LIMIT);

const FIELDS: &[FieldSpec] = &[
    STARTING_REPS,
    QUOTA_PER_REP,
    ATTRITION_RATE,
    HIRING_PLAN,
    RAMP_TIME_MONTHS,
];

const MONTHS_PER_YEAR: Decimal = dec!(12);
/// Share of the ramp period a new hire is unproductive.
const RAMP_INEFFICIENCY: Decimal = dec!(0.6);
/// Share of a year a departing rep is assumed to miss.
const ATTRITION_LOSS: Decimal = dec!(0.5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaCliffInput {
    pub starting_reps: Decimal,
    /// Annual quota per fully ramped rep.
    pub quota_per_rep: Decimal,
    /// Annual attrition, percent.
    pub attrition_rate: Decimal,
    pub ramp_time_months: Decimal,
    /// New reps hired per month.
    pub hiring_plan: Decimal,
}

impl Default for QuotaCliffInput {
    fn default() -> Self {
        Self {
            starting_reps: dec!(10),
            quota_per_rep: dec!(500000),
            attrition_rate: dec!(15),
            ramp_time_months: dec!(6),
            hiring_plan: dec!(2),
        }
    }
}

impl CalculatorInput for QuotaCliffInput {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            starting_reps: within_limit(&STARTING_REPS, self.starting_reps, defaults.starting_reps),
            quota_per_rep: within_limit(&QUOTA_PER_REP, self.quota_per_rep, defaults.quota_per_rep),
            attrition_rate: within_limit(
                &ATTRITION_RATE,
                self.attrition_rate,
                defaults.attrition_rate,
            ),
            ramp_time_months: within_limit(
                &RAMP_TIME_MONTHS,
                self.ramp_time_months,
                defaults.ramp_time_months,
            ),
            hiring_plan: within_limit(&HIRING_PLAN, self.hiring_plan, defaults.hiring_plan),
        }
    }

    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let defaults = Self::default();
        match key {
            "starting_reps" => {
                self.starting_reps = coerce_decimal(&STARTING_REPS, raw, defaults.starting_reps)
            }
            "quota_per_rep" => {
                self.quota_per_rep = coerce_decimal(&QUOTA_PER_REP, raw, defaults.quota_per_rep)
            }
            "attrition_rate" => {
                self.attrition_rate = coerce_decimal(&ATTRITION_RATE, raw, defaults.attrition_rate)
            }
            "ramp_time_months" => {
                self.ramp_time_months =
                    coerce_decimal(&RAMP_TIME_MONTHS, raw, defaults.ramp_time_months)
            }
            "hiring_plan" => {
                self.hiring_plan = coerce_decimal(&HIRING_PLAN, raw, defaults.hiring_plan)
            }
            other => return Err(InputError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        vec![
            (STARTING_REPS.label, format_count(self.starting_reps)),
            (QUOTA_PER_REP.label, format_currency(self.quota_per_rep)),
            (ATTRITION_RATE.label, format_percent(self.attrition_rate)),
            (HIRING_PLAN.label, format_plain(self.hiring_plan)),
            (RAMP_TIME_MONTHS.label, format_plain(self.ramp_time_months)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaCliffMetrics {
    pub total_hires: Decimal,
    pub end_headcount: Decimal,
    pub spreadsheet_capacity: Decimal,
    pub ramp_drag: Decimal,
    pub attrition_drag: Decimal,
    pub street_capacity: Decimal,
    pub gap: Decimal,
    /// Gap as a whole percentage of spreadsheet capacity; `None` when
    /// spreadsheet capacity is zero.
    pub gap_pct: Option<Decimal>,
}

/// Capacity planning calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotaCliffCalculator;

impl Calculator for QuotaCliffCalculator {
    type Input = QuotaCliffInput;
    type Metrics = QuotaCliffMetrics;
    type Classification = Unclassified;

    fn id(&self) -> CalculatorId {
        CalculatorId::QuotaCliff
    }

    fn compute(
        &self,
        input: &QuotaCliffInput,
    ) -> OutcomeOf<Self> {
        let input = input.clone().sanitized();
        let total_hires = input.hiring_plan * MONTHS_PER_YEAR;
        let end_headcount = input.starting_reps + total_hires;
        let spreadsheet_capacity = (input.starting_reps + end_headcount) / dec!(2) * input.quota_per_rep;

        let lost_rep_months = total_hires * input.ramp_time_months * RAMP_INEFFICIENCY;
        let ramp_drag = lost_rep_months * input.quota_per_rep / MONTHS_PER_YEAR;
        let attrition_drag = input.starting_reps * input.attrition_rate / dec!(100)
            * ATTRITION_LOSS
            * input.quota_per_rep;

        let street_capacity = spreadsheet_capacity - ramp_drag - attrition_drag;
        let gap = spreadsheet_capacity - street_capacity;
        let gap_pct = ratio(gap * dec!(100), spreadsheet_capacity).map(round_whole);

        Outcome {
            metrics: QuotaCliffMetrics {
                total_hires,
                end_headcount,
                spreadsheet_capacity: round_whole(spreadsheet_capacity),
                ramp_drag: round_whole(ramp_drag),
                attrition_drag: round_whole(attrition_drag),
                street_capacity: round_whole(street_capacity),
                gap: round_whole(gap),
                gap_pct,
            },
            classification: Unclassified,
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!(
            "Gap Identified: {} ({})",
            format_optional_percent(outcome.metrics.gap_pct),
            format_currency(outcome.metrics.gap),
        )
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        let metrics = &outcome.metrics;
        vec![
            ("Total Hires", format_count(metrics.total_hires)),
            ("End Headcount", format_count(metrics.end_headcount)),
            ("Spreadsheet Capacity", format_currency(metrics.spreadsheet_capacity)),
            ("Ramp Drag", format_currency(metrics.ramp_drag)),
            ("Attrition Drag", format_currency(metrics.attrition_drag)),
            ("Street Capacity", format_currency(metrics.street_capacity)),
            ("Capacity Gap", format_currency(metrics.gap)),
            ("Capacity Gap (%)", format_optional_percent(metrics.gap_pct)),
        ]
    }

    fn form_id(&self) -> Option<FormId> {
        Some(FormId::QuotaCliff)
    }
}
