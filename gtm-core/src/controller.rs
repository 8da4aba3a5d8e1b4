//! Derived-state controller: owns one calculator's raw input and keeps its
//! outcome in step with it.
//!
//! The outcome is never edited directly. Every mutator replaces the input,
//! recomputes synchronously, and only then awaits the write-through to the
//! optional [`StateStore`]. Dropping a mutator future therefore abandons the
//! write but never leaves input and outcome out of step.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::calculations::{Calculator, CalculatorInput, OutcomeOf};
use crate::export::{self, ExportError};
use crate::input::InputError;
use crate::models::LeadSubmission;
use crate::store::{StateStore, load_or_default, save_value};

pub struct CalculatorController<C: Calculator> {
    calculator: C,
    input: C::Input,
    outcome: OutcomeOf<C>,
    store: Option<Arc<dyn StateStore>>,
}

impl<C: Calculator> CalculatorController<C> {
    /// In-memory controller seeded with the calculator's defaults.
    pub fn new(calculator: C) -> Self {
        Self::with_input(calculator, C::Input::default())
    }

    /// In-memory controller seeded with `input`.
    pub fn with_input(
        calculator: C,
        input: C::Input,
    ) -> Self {
        let input = input.sanitized();
        let outcome = calculator.compute(&input);
        Self {
            calculator,
            input,
            outcome,
            store: None,
        }
    }

    /// Persistent controller seeded from `store`.
    ///
    /// A missing, unreadable or corrupt stored value falls back to defaults;
    /// the failure is logged and never returned.
    pub async fn rehydrate(
        calculator: C,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let key = calculator.id().storage_key();
        let input: C::Input = load_or_default(store.as_ref(), &key).await;
        debug!(key = %key, "rehydrated calculator state");

        let mut controller = Self::with_input(calculator, input);
        controller.store = Some(store);
        controller
    }

    pub fn calculator(&self) -> &C {
        &self.calculator
    }

    pub fn input(&self) -> &C::Input {
        &self.input
    }

    pub fn outcome(&self) -> &OutcomeOf<C> {
        &self.outcome
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Outcome for an arbitrary input. Does not touch controller state.
    pub fn compute(
        &self,
        input: &C::Input,
    ) -> OutcomeOf<C> {
        self.calculator.compute(input)
    }

    /// Applies `edit` to the current input.
    pub async fn update<F>(
        &mut self,
        edit: F,
    ) where
        F: FnOnce(&mut C::Input) + Send,
    {
        edit(&mut self.input);
        self.commit().await;
    }

    /// Applies one raw field edit. An unknown key changes nothing and is
    /// not persisted.
    pub async fn set_field(
        &mut self,
        key: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        self.input.set_field(key, raw)?;
        self.commit().await;
        Ok(())
    }

    /// Replaces the whole input.
    pub async fn replace(
        &mut self,
        input: C::Input,
    ) {
        self.input = input;
        self.commit().await;
    }

    /// Restores the documented defaults.
    pub async fn reset(&mut self) {
        self.replace(C::Input::default()).await;
    }

    pub fn summary(&self) -> String {
        self.calculator.summary(&self.outcome)
    }

    /// Lead for the current outcome, or `None` if this calculator does not
    /// capture leads.
    pub fn lead_submission(
        &self,
        contact: &str,
    ) -> Option<LeadSubmission> {
        let form = self.calculator.form_id()?;
        Some(LeadSubmission::new(
            form,
            self.calculator.lead_fields(contact, &self.outcome),
        ))
    }

    pub fn export_csv(&self) -> Result<String, ExportError> {
        export::export_csv(&self.calculator, &self.input, &self.outcome)
    }

    async fn commit(&mut self) {
        let input = std::mem::take(&mut self.input);
        self.input = input.sanitized();
        self.outcome = self.calculator.compute(&self.input);
        self.persist().await;
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let key = self.calculator.id().storage_key();
        if let Err(error) = save_value(store.as_ref(), &key, &self.input).await {
            warn!(key = %key, %error, "failed to persist calculator state, continuing in memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tokio::sync::Notify;

    use super::*;
    use crate::calculations::{
        MaturityCalculator, RuleOf40Calculator, RuleOf40Input, VelocityCalculator, VelocityInput,
    };
    use crate::models::{CalculatorId, FormId};
    use crate::store::{MemoryStore, StoreError};

    /// Every operation fails as if browser storage were disabled.
    struct UnavailableStore;

    #[async_trait]
    impl StateStore for UnavailableStore {
        async fn load(
            &self,
            _key: &str,
        ) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }

        async fn save(
            &self,
            _key: &str,
            _value: &str,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }

        async fn remove(
            &self,
            _key: &str,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }
    }

    /// Holds every save until released; records the saves that completed.
    #[derive(Default)]
    struct GatedStore {
        gate: Notify,
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StateStore for GatedStore {
        async fn load(
            &self,
            _key: &str,
        ) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn save(
            &self,
            key: &str,
            _value: &str,
        ) -> Result<(), StoreError> {
            self.gate.notified().await;
            self.saved.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn remove(
            &self,
            _key: &str,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    // =========================================================================
    // recomputation
    // =========================================================================

    #[tokio::test]
    async fn new_controller_holds_default_outcome() {
        let controller = CalculatorController::new(VelocityCalculator);

        assert_eq!(controller.input(), &VelocityInput::default());
        assert_eq!(controller.outcome().metrics.velocity, dec!(83333));
        assert!(!controller.is_persistent());
    }

    #[tokio::test]
    async fn set_field_recomputes_synchronously() {
        let mut controller = CalculatorController::new(VelocityCalculator);

        controller.set_field("sales_cycle_days", "30").await.unwrap();

        assert_eq!(controller.outcome().metrics.velocity, dec!(250000));
    }

    #[tokio::test]
    async fn outcome_always_matches_current_input() {
        let mut controller = CalculatorController::new(RuleOf40Calculator);

        controller
            .update(|input| input.growth_rate = dec!(-20))
            .await;
        controller.set_field("profit_margin", "50").await.unwrap();

        assert_eq!(controller.outcome(), &controller.compute(controller.input()));
        assert_eq!(controller.outcome().metrics.score, dec!(30));
    }

    #[tokio::test]
    async fn unknown_field_leaves_state_untouched() {
        let mut controller = CalculatorController::new(RuleOf40Calculator);

        let result = controller.set_field("burn_multiple", "2").await;

        assert_eq!(
            result,
            Err(InputError::UnknownField("burn_multiple".to_string()))
        );
        assert_eq!(controller.input(), &RuleOf40Input::default());
    }

    #[tokio::test]
    async fn update_sanitizes_out_of_range_values() {
        let mut controller = CalculatorController::new(RuleOf40Calculator);

        controller
            .update(|input| input.profit_margin = dec!(99999))
            .await;

        assert_eq!(controller.input().profit_margin, dec!(15));
    }

    // =========================================================================
    // persistence
    // =========================================================================

    #[tokio::test]
    async fn persisted_input_survives_remount() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());

        let mut first = CalculatorController::rehydrate(VelocityCalculator, store.clone()).await;
        first.set_field("opportunities", "75").await.unwrap();
        let saved = first.input().clone();
        drop(first);

        let second = CalculatorController::rehydrate(VelocityCalculator, store).await;

        assert_eq!(second.input(), &saved);
        assert_eq!(second.outcome(), &second.compute(&saved));
    }

    #[tokio::test]
    async fn only_raw_input_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let mut controller =
            CalculatorController::rehydrate(RuleOf40Calculator, store.clone()).await;

        controller.set_field("growth_rate", "40").await.unwrap();

        let raw = store
            .load(&CalculatorId::RuleOf40.storage_key())
            .await
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json.get("growth_rate").is_some());
        assert!(json.get("score").is_none());
    }

    #[tokio::test]
    async fn corrupt_state_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(&CalculatorId::PipelineVelocity.storage_key(), "{not json")
            .await
            .unwrap();

        let controller = CalculatorController::rehydrate(VelocityCalculator, store).await;

        assert_eq!(controller.input(), &VelocityInput::default());
    }

    #[tokio::test]
    async fn out_of_range_stored_values_are_sanitized() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(
                &CalculatorId::PipelineVelocity.storage_key(),
                r#"{"opportunities":"5000000000000","win_rate":"25"}"#,
            )
            .await
            .unwrap();

        let controller = CalculatorController::rehydrate(VelocityCalculator, store).await;

        assert_eq!(controller.input().opportunities, dec!(50));
        assert_eq!(controller.input().win_rate, dec!(25));
    }

    #[tokio::test]
    async fn unavailable_store_keeps_working_in_memory() {
        let mut controller =
            CalculatorController::rehydrate(VelocityCalculator, Arc::new(UnavailableStore)).await;

        controller.set_field("deal_value", "50000").await.unwrap();

        assert_eq!(controller.input().deal_value, dec!(50000));
        assert_eq!(controller.outcome().metrics.velocity, dec!(166667));
    }

    #[tokio::test]
    async fn dropped_edit_abandons_write_but_keeps_outcome_current() {
        let store = Arc::new(GatedStore::default());
        let mut controller =
            CalculatorController::rehydrate(VelocityCalculator, store.clone()).await;

        let pending = tokio::time::timeout(
            Duration::from_millis(10),
            controller.set_field("sales_cycle_days", "30"),
        )
        .await;

        assert!(pending.is_err(), "gated save should not resolve");
        assert!(store.saved.lock().unwrap().is_empty());
        assert_eq!(controller.input().sales_cycle_days, dec!(30));
        assert_eq!(controller.outcome(), &controller.compute(controller.input()));
        assert_eq!(controller.outcome().metrics.velocity, dec!(250000));

        store.gate.notify_one();
        tokio::task::yield_now().await;
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_restores_and_persists_defaults() {
        let store = Arc::new(MemoryStore::new());
        let mut controller = CalculatorController::rehydrate(MaturityCalculator, store.clone()).await;
        controller.set_field("answer", "0").await.unwrap();

        controller.reset().await;

        assert!(controller.input().answers.is_empty());
        let reloaded = CalculatorController::rehydrate(MaturityCalculator, store).await;
        assert!(reloaded.input().answers.is_empty());
    }

    // =========================================================================
    // leads and export
    // =========================================================================

    #[tokio::test]
    async fn lead_submission_snapshots_current_outcome() {
        let mut controller = CalculatorController::new(RuleOf40Calculator);
        controller.set_field("growth_rate", "-20").await.unwrap();
        controller.set_field("profit_margin", "50").await.unwrap();

        let submission = controller.lead_submission("cfo@example.com").unwrap();

        assert_eq!(submission.form, FormId::RuleOf40);
        assert_eq!(
            submission.field("message").map(ToString::to_string),
            Some("Rule of 40 Score: 30".to_string())
        );
    }

    #[tokio::test]
    async fn maturity_has_no_lead_form() {
        let controller = CalculatorController::new(MaturityCalculator);

        assert_eq!(controller.lead_submission("cfo@example.com"), None);
    }

    #[tokio::test]
    async fn export_starts_with_header() {
        let controller = CalculatorController::new(VelocityCalculator);

        let csv = controller.export_csv().unwrap();

        assert!(csv.starts_with("Metric,Value\nOpportunities,50\n"));
    }
}
