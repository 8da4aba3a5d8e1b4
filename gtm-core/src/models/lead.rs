use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hosted CRM forms a lead can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormId {
    Contact,
    PipelineVelocity,
    SaasCompass,
    QuotaCliff,
    RevenueLeakage,
    #[serde(rename = "rule_of_40")]
    RuleOf40,
    IcpScore,
}

impl FormId {
    pub fn all() -> &'static [FormId] {
        &[
            Self::Contact,
            Self::PipelineVelocity,
            Self::SaasCompass,
            Self::QuotaCliff,
            Self::RevenueLeakage,
            Self::RuleOf40,
            Self::IcpScore,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::PipelineVelocity => "pipeline_velocity",
            Self::SaasCompass => "saas_compass",
            Self::QuotaCliff => "quota_cliff",
            Self::RevenueLeakage => "revenue_leakage",
            Self::RuleOf40 => "rule_of_40",
            Self::IcpScore => "icp_score",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|form| form.as_str() == s)
    }
}

impl fmt::Display for FormId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single form value. The CRM accepts both text and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadValue {
    Text(String),
    Number(Decimal),
}

impl fmt::Display for LeadValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number.normalize()),
        }
    }
}

impl From<&str> for LeadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LeadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for LeadValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadField {
    pub name: String,
    pub value: LeadValue,
}

impl LeadField {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<LeadValue>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One outbound submission: the target form plus its fields in send order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub form: FormId,
    pub fields: Vec<LeadField>,
}

impl LeadSubmission {
    pub fn new(
        form: FormId,
        fields: Vec<LeadField>,
    ) -> Self {
        Self { form, fields }
    }

    /// Returns the value of the first field called `name`.
    pub fn field(
        &self,
        name: &str,
    ) -> Option<&LeadValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }
}

/// Values collected by the site's contact page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub firstname: String,
    pub email: String,
    pub company: String,
    pub message: String,
}

impl From<ContactRequest> for LeadSubmission {
    fn from(request: ContactRequest) -> Self {
        LeadSubmission::new(
            FormId::Contact,
            vec![
                LeadField::new("firstname", request.firstname),
                LeadField::new("email", request.email),
                LeadField::new("company", request.company),
                LeadField::new("message", request.message),
            ],
        )
    }
}

/// Observable state of a lead form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error { message: String },
}

impl SubmissionStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Success => "success",
            Self::Error { .. } => "error",
        }
    }
}
