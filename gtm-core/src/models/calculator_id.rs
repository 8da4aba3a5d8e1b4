use serde::{Deserialize, Serialize};

/// Namespace shared by every persisted calculator key.
pub const STORAGE_NAMESPACE: &str = "gtm360:calculator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorId {
    PipelineVelocity,
    SaasCompass,
    QuotaCliff,
    RevenueLeakage,
    #[serde(rename = "rule_of_40")]
    RuleOf40,
    IcpScore,
    RevenueMaturity,
}

impl CalculatorId {
    pub fn all() -> &'static [CalculatorId] {
        &[
            Self::PipelineVelocity,
            Self::SaasCompass,
            Self::QuotaCliff,
            Self::RevenueLeakage,
            Self::RuleOf40,
            Self::IcpScore,
            Self::RevenueMaturity,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PipelineVelocity => "pipeline_velocity",
            Self::SaasCompass => "saas_compass",
            Self::QuotaCliff => "quota_cliff",
            Self::RevenueLeakage => "revenue_leakage",
            Self::RuleOf40 => "rule_of_40",
            Self::IcpScore => "icp_score",
            Self::RevenueMaturity => "revenue_maturity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.as_str() == s)
    }

    /// Human-readable widget title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::PipelineVelocity => "Revenue Velocity",
            Self::SaasCompass => "The SaaS Compass",
            Self::QuotaCliff => "The Quota Cliff",
            Self::RevenueLeakage => "Revenue Leakage",
            Self::RuleOf40 => "The Rule of 40",
            Self::IcpScore => "ICP Signal Scorer",
            Self::RevenueMaturity => "Revenue Maturity Calculator",
        }
    }

    /// Stable key under which the calculator's raw inputs are persisted.
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_NAMESPACE}:{}", self.as_str())
    }
}

impl std::fmt::Display for CalculatorId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_round_trips_every_identifier() {
        for id in CalculatorId::all() {
            assert_eq!(CalculatorId::parse(id.as_str()), Some(*id));
        }
    }

    #[test]
    fn parse_rejects_unknown_identifier() {
        assert_eq!(CalculatorId::parse("burn_multiple"), None);
    }

    #[test]
    fn storage_key_is_namespaced() {
        assert_eq!(
            CalculatorId::QuotaCliff.storage_key(),
            "gtm360:calculator:quota_cliff"
        );
    }

    #[test]
    fn serde_uses_snake_case_identifiers() {
        let json = serde_json::to_string(&CalculatorId::RuleOf40).unwrap();

        assert_eq!(json, "\"rule_of_40\"");
    }
}
