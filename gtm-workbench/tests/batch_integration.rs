//! Runs the batch path against on-disk fixture files.

use std::path::{Path, PathBuf};

use gtm_core::calculations::VelocityCalculator;
use gtm_core::{CalculatorId, FormId, SiteConfig};
use gtm_workbench::app;
use gtm_workbench::scenario_loader;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn fixture_scenarios_load_in_file_order() {
    let scenarios =
        scenario_loader::load_from_file::<VelocityCalculator>(&fixture("velocity_scenarios.csv"))
            .unwrap();

    assert_eq!(scenarios.len(), 3);
    assert_eq!(scenarios[1].deal_value, dec!(8000));
    // Empty cells fall back to defaults.
    assert_eq!(scenarios[2].opportunities, dec!(30));
    assert_eq!(scenarios[2].win_rate, dec!(20));
}

#[test]
fn batch_writes_one_result_per_scenario() {
    let csv = app::run_batch(CalculatorId::PipelineVelocity, &fixture("velocity_scenarios.csv"))
        .unwrap();

    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "Scenario,Opportunities,Deal Value ($),Win Rate (%),Cycle Length (Days),Revenue Velocity ($/mo),Summary"
    );
    assert!(lines[1].starts_with("1,50,\"$25,000\",20%,90,\"$83,333\","));
}

#[test]
fn missing_file_is_an_error() {
    let result = app::run_batch(CalculatorId::RuleOf40, &fixture("does_not_exist.csv"));

    assert!(result.is_err());
}

#[test]
fn fixture_config_loads() {
    let config = SiteConfig::load(&fixture("gtm360.toml")).unwrap();

    assert_eq!(config.storage.backend, "memory");
    assert!(config.storage.persists(CalculatorId::QuotaCliff));
    assert!(!config.storage.persists(CalculatorId::PipelineVelocity));
    assert_eq!(
        config.leads.form_guid(FormId::QuotaCliff),
        Some("00000000-0000-0000-0000-00000000c11f")
    );
    // Clearbit is enabled without a key, so only analytics remains.
    assert_eq!(config.analytics.enabled_providers().len(), 1);
}
