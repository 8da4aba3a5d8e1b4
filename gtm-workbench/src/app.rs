//! Wiring between the site configuration, the storage and lead backends, and
//! the calculators.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use gtm_core::calculations::{
    Calculator, CalculatorInput, Classification, IcpCalculator, LeakageCalculator,
    MaturityCalculator, QuotaCliffCalculator, RuleOf40Calculator, SaasCompassCalculator,
    VelocityCalculator,
};
use gtm_core::config::LeadsConfig;
use gtm_core::input::FieldSpec;
use gtm_core::leads::{DryRunSubmitter, LeadCapture, LeadSubmitter, SubmissionError};
use gtm_core::store::{StateStore, StoreConfig, StoreRegistry};
use gtm_core::{CalculatorController, CalculatorId, LeadSubmission, SiteConfig};
use gtm_leads_hubspot::HubSpotSubmitter;
use gtm_store_sqlite::SqliteStoreFactory;
use tracing::{debug, info};

use crate::output::CalcReport;
use crate::scenario_loader;
use crate::ticker::StepTicker;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const SPINNER_PERIOD: Duration = Duration::from_millis(120);

/// Runs `$body` with `$calc` bound to the calculator for `$id`.
macro_rules! with_calculator {
    ($id:expr, $calc:ident => $body:expr) => {
        match $id {
            CalculatorId::PipelineVelocity => {
                let $calc = VelocityCalculator;
                $body
            }
            CalculatorId::SaasCompass => {
                let $calc = SaasCompassCalculator;
                $body
            }
            CalculatorId::QuotaCliff => {
                let $calc = QuotaCliffCalculator;
                $body
            }
            CalculatorId::RevenueLeakage => {
                let $calc = LeakageCalculator;
                $body
            }
            CalculatorId::RuleOf40 => {
                let $calc = RuleOf40Calculator;
                $body
            }
            CalculatorId::IcpScore => {
                let $calc = IcpCalculator;
                $body
            }
            CalculatorId::RevenueMaturity => {
                let $calc = MaturityCalculator;
                $body
            }
        }
    };
}

/// Every storage backend this binary can open.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::with_builtin_backends();
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// HubSpot submitter, or a logging stand-in when `dry_run` is set.
pub fn build_submitter(
    config: &LeadsConfig,
    dry_run: bool,
) -> Result<Arc<dyn LeadSubmitter>> {
    if dry_run {
        return Ok(Arc::new(DryRunSubmitter));
    }
    let submitter = HubSpotSubmitter::new(config.clone()).context("failed to set up lead submission")?;
    Ok(Arc::new(submitter))
}

/// Parses a `key=value` edit.
pub fn parse_edit(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Input fields of `id`, in display order.
pub fn fields(id: CalculatorId) -> &'static [FieldSpec] {
    with_calculator!(id, calc => fields_of(calc))
}

fn fields_of<C: Calculator>(_calculator: C) -> &'static [FieldSpec] {
    C::Input::fields()
}

/// Shared state for one workbench invocation.
pub struct Workbench {
    config: SiteConfig,
    store: Arc<dyn StateStore>,
}

impl Workbench {
    /// Opens the store named by `config.storage`.
    pub async fn open(config: SiteConfig) -> Result<Self> {
        let store_config = config.storage.store_config();
        let store = open_store(&store_config).await?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(
        config: SiteConfig,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    async fn controller<C: Calculator>(
        &self,
        calculator: C,
    ) -> CalculatorController<C> {
        if self.config.storage.persists(calculator.id()) {
            CalculatorController::rehydrate(calculator, self.store.clone()).await
        } else {
            debug!(calculator = %calculator.id(), "persistence disabled, using defaults");
            CalculatorController::new(calculator)
        }
    }

    /// Applies `edits` in order (after restoring defaults if `reset`) and
    /// reports the resulting state.
    pub async fn calculate(
        &self,
        id: CalculatorId,
        edits: &[(String, String)],
        reset: bool,
    ) -> Result<CalcReport> {
        with_calculator!(id, calc => self.calculate_with(calc, edits, reset).await)
    }

    async fn calculate_with<C: Calculator>(
        &self,
        calculator: C,
        edits: &[(String, String)],
        reset: bool,
    ) -> Result<CalcReport> {
        let mut controller = self.controller(calculator).await;
        if reset {
            controller.reset().await;
        }
        for (key, raw) in edits {
            controller
                .set_field(key, raw)
                .await
                .with_context(|| format!("cannot edit {}", calculator.id()))?;
        }
        report(&controller)
    }

    /// Lead for the stored state of `id`.
    pub async fn lead_for(
        &self,
        id: CalculatorId,
        contact: &str,
    ) -> Result<LeadSubmission> {
        with_calculator!(id, calc => {
            self.controller(calc)
                .await
                .lead_submission(contact)
                .with_context(|| format!("{id} does not capture leads"))
        })
    }

}

/// Evaluates every scenario in `path` and returns the result CSV. Stored
/// state is neither read nor written.
pub fn run_batch(
    id: CalculatorId,
    path: &Path,
) -> Result<String> {
    with_calculator!(id, calc => {
        scenario_loader::run_file(calc, path)
            .with_context(|| format!("batch run of {id} over '{}' failed", path.display()))
    })
}

async fn open_store(config: &StoreConfig) -> Result<Arc<dyn StateStore>> {
    let registry = build_registry();
    let store = registry
        .create(config)
        .await
        .with_context(|| format!("failed to open '{}' state store", config.backend))?;
    info!(backend = %config.backend, "state store ready");
    Ok(store)
}

fn report<C: Calculator>(controller: &CalculatorController<C>) -> Result<CalcReport> {
    let calculator = controller.calculator();
    let outcome = controller.outcome();
    let label = outcome.classification.label();

    Ok(CalcReport {
        calculator: calculator.id(),
        title: calculator.id().title(),
        summary: controller.summary(),
        classification: (!label.is_empty()).then_some(label),
        inputs: controller.input().rows().into_iter().map(Into::into).collect(),
        results: calculator
            .metric_rows(outcome)
            .into_iter()
            .map(Into::into)
            .collect(),
        metrics: serde_json::to_value(&outcome.metrics).context("failed to encode metrics")?,
    })
}

/// Submits through `capture`, drawing a spinner on stderr while waiting.
pub async fn submit_with_progress(
    capture: &LeadCapture,
    submission: &LeadSubmission,
    progress: bool,
) -> Result<(), SubmissionError> {
    let send = capture.submit(submission);
    if !progress {
        return send.await;
    }
    tokio::pin!(send);

    let ticker = StepTicker::new(SPINNER.len(), SPINNER_PERIOD);
    let mut steps = ticker.subscribe();
    loop {
        tokio::select! {
            result = &mut send => {
                eprint!("\r              \r");
                return result;
            }
            Ok(()) = steps.changed() => {
                let step = *steps.borrow_and_update();
                eprint!("\r{} submitting", SPINNER[step]);
            }
        }
    }
}
