//! Metric formulas for the site's lead-magnet calculators.
//!
//! Every calculator is a stateless unit type implementing [`Calculator`].
//! Its input type implements [`CalculatorInput`], which covers coercion of raw
//! entries and the persisted JSON shape. `compute` is a pure function of the
//! input: the same input always yields the same [`Outcome`].

pub mod calculators;
pub mod common;

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::input::{FieldSpec, InputError};
use crate::models::{CalculatorId, FormId, LeadField};

pub use calculators::{
    CompassHealth, CriterionLevel, IcpCalculator, IcpInput, IcpMetrics, IcpSignal,
    LeakageCalculator, LeakageInput, LeakageMetrics, MaturityCalculator, MaturityInput,
    MaturityMetrics, MaturityTier, QuotaCliffCalculator, QuotaCliffInput, QuotaCliffMetrics,
    RuleOf40Calculator, RuleOf40Input, RuleOf40Metrics, RuleOf40Status, SaasCompassCalculator,
    SaasCompassInput, SaasCompassMetrics, VelocityCalculator, VelocityInput, VelocityMetrics,
};

/// A displayed label/value pair, as used by CSV export and the CLI.
pub type Row = (&'static str, String);

/// A tag derived by thresholding one or more metrics.
pub trait Classification: Clone + Debug + PartialEq + Serialize + Send + Sync {
    /// Label shown next to the metrics.
    fn label(&self) -> &'static str;
}

/// Marker for calculators whose output carries no classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Unclassified;

impl Classification for Unclassified {
    fn label(&self) -> &'static str {
        ""
    }
}

/// Derived metrics plus the classification computed from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome<M, K> {
    pub metrics: M,
    pub classification: K,
}

/// Outcome type produced by calculator `C`.
pub type OutcomeOf<C> = Outcome<<C as Calculator>::Metrics, <C as Calculator>::Classification>;

/// Raw inputs of one calculator.
///
/// `Default` returns the documented defaults. Deserialization must accept
/// partial objects (missing fields take their default), which lets a stored
/// state written by an older field set still rehydrate.
pub trait CalculatorInput:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Editable fields in display order.
    fn fields() -> &'static [FieldSpec];

    /// Replaces every out-of-range value with its field default.
    fn sanitized(self) -> Self;

    /// Applies one raw edit. Unparseable or empty entries become the field
    /// default; an unknown key is an error and leaves the input untouched.
    fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError>;

    /// Current values as displayed.
    fn rows(&self) -> Vec<Row>;
}

/// A pure metric formula with its presentation contract.
pub trait Calculator: Copy + Default + Send + Sync + 'static {
    type Input: CalculatorInput;
    type Metrics: Clone + Debug + PartialEq + Serialize + Send + Sync;
    type Classification: Classification;

    fn id(&self) -> CalculatorId;

    /// Computes metrics and classification. Out-of-range fields are replaced
    /// with their defaults first, so every formula stays within `Decimal`
    /// range and never panics.
    fn compute(
        &self,
        input: &Self::Input,
    ) -> OutcomeOf<Self>;

    /// Human-readable headline sent as the lead `message` field.
    fn summary(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> String;

    /// Derived values as displayed.
    fn metric_rows(
        &self,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<Row>;

    /// CRM form this calculator submits to, if it captures leads at all.
    fn form_id(&self) -> Option<FormId>;

    /// Name of the contact field collected alongside the summary.
    fn contact_field(&self) -> &'static str {
        "email"
    }

    /// Ordered lead fields: the contact value followed by the summary.
    fn lead_fields(
        &self,
        contact: &str,
        outcome: &OutcomeOf<Self>,
    ) -> Vec<LeadField> {
        vec![
            LeadField::new(self.contact_field(), contact),
            LeadField::new("message", self.summary(outcome)),
        ]
    }
}
