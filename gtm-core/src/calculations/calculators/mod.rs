//! Calculator implementations, one module per widget.

pub mod capacity;
pub mod icp;
pub mod leakage;
pub mod maturity;
pub mod rule_of_40;
pub mod unit_economics;
pub mod velocity;

pub use capacity::{QuotaCliffCalculator, QuotaCliffInput, QuotaCliffMetrics};
pub use icp::{CriterionLevel, IcpCalculator, IcpInput, IcpMetrics, IcpSignal};
pub use leakage::{LeakageCalculator, LeakageInput, LeakageMetrics};
pub use maturity::{MaturityCalculator, MaturityInput, MaturityMetrics, MaturityTier};
pub use rule_of_40::{RuleOf40Calculator, RuleOf40Input, RuleOf40Metrics, RuleOf40Status};
pub use unit_economics::{
    CompassHealth, SaasCompassCalculator, SaasCompassInput, SaasCompassMetrics,
};
pub use velocity::{VelocityCalculator, VelocityInput, VelocityMetrics};
