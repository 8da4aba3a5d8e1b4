//! ICP signal scoring: five qualification criteria worth up to 20 points each.
//!
//! The score is a plain sum, so it never exceeds 100.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::{Calculator, CalculatorInput, Classification, Outcome, OutcomeOf, Row};
use crate::input::{FieldSpec, InputError};
use crate::models::{CalculatorId, FormId};

const CRITERION_LIMIT: Decimal = dec!(20);

const BUDGET: FieldSpec = FieldSpec::new("budget", "Budget Confirmed", CRITERION_LIMIT);
const AUTHORITY: FieldSpec = FieldSpec::new("authority", "Access to DM", CRITERION_LIMIT);
const NEED: FieldSpec = FieldSpec::new("need", "Pain Quantified", CRITERION_LIMIT);
const TIMELINE: FieldSpec = FieldSpec::new("timeline", "Timeline < 90 Days", CRITERION_LIMIT);
const TECH_FIT: FieldSpec = FieldSpec::new("tech_fit", "Tech Stack Match", CRITERION_LIMIT);

const FIELDS: &[FieldSpec] = &[BUDGET, AUTHORITY, NEED, TIMELINE, TECH_FIT];

/// How well a lead meets one criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriterionLevel {
    #[default]
    None,
    Partial,
    Full,
}

impl CriterionLevel {
    pub fn points(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Partial => 10,
            Self::Full => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Partial => "partial",
            Self::Full => "full",
        }
    }

    /// Accepts the level names, their point values, and `yes`/`no`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no" | "0" => Some(Self::None),
            "partial" | "10" => Some(Self::Partial),
            "full" | "yes" | "20" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for CriterionLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpInput {
    pub budget: CriterionLevel,
    pub authority: CriterionLevel,
    pub need: CriterionLevel,
    pub timeline: CriterionLevel,
    pub tech_fit: CriterionLevel,
}

impl IcpInput {
    fn levels(&self) -> [CriterionLevel; 5] {
        [
            self.budget,
            self.authority,
            self.need,
            self.timeline,
            self.tech_fit,
        ]
    }
}

impl CalculatorInput for IcpInput {
    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn sanitized(self) -> Self {
        // Every representable level is valid.
        self
    }

    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let slot = match key {
            "budget" => &mut self.budget,
            "authority" => &mut self.authority,
            "need" => &mut self.need,
            "timeline" => &mut self.timeline,
            "tech_fit" => &mut self.tech_fit,
            other => return Err(InputError::UnknownField(other.to_string())),
        };
        *slot = CriterionLevel::parse(raw).unwrap_or_else(|| {
            tracing::warn!(field = key, raw, "invalid criterion level, using default");
            CriterionLevel::default()
        });
        Ok(())
    }

    fn rows(&self) -> Vec<Row> {
        FIELDS
            .iter()
            .zip(self.levels())
            .map(|(field, level)| (field.label, level.points().to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IcpMetrics {
    /// Total out of 100.
    pub score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcpSignal {
    High,
    Medium,
    Low,
}

impl IcpSignal {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => Self::High,
            50.. => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl Classification for IcpSignal {
    fn label(&self) -> &'static str {
        match self {
            Self::High => "High Signal",
            Self::Medium => "Medium Signal",
            Self::Low => "Low Signal",
        }
    }
}

/// ICP signal scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcpCalculator;

impl Calculator for IcpCalculator {
    type Input = IcpInput;
    type Metrics = IcpMetrics;
    type Classification = IcpSignal;

    fn id(&self) -> CalculatorId {
        CalculatorId::IcpScore
    }

    fn compute(
        &self,
        input: &IcpInput,
    ) -> OutcomeOf<Self> {
        let score: u32 = input.levels().iter().map(CriterionLevel::points).sum();
        Outcome {
            metrics: IcpMetrics { score },
            classification: IcpSignal::from_score(score),
        }
    }

    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String {
        format!(
            "ICP Score: {}/100 ({})",
            outcome.metrics.score,
            outcome.classification.label()
        )
    }

    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row> {
        vec![
            ("ICP Score", format!("{}/100", outcome.metrics.score)),
            ("Signal", outcome.classification.label().to_string()),
        ]
    }

    fn form_id(&self) -> Option<FormId> {
        Some(FormId::IcpScore)
    }

    /// The scorer collects the lead's name rather than an email address.
    fn contact_field(&self) -> &'static str {
        "firstname"
    }
}
