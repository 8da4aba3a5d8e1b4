//! Controller rehydration against the on-disk JSON store.

use std::sync::Arc;

use gtm_core::calculations::{IcpCalculator, VelocityCalculator, VelocityInput};
use gtm_core::store::{JsonFileStore, StoreConfig, StoreRegistry};
use gtm_core::{CalculatorController, CalculatorId, StateStore};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tempfile::TempDir;

async fn store_in(dir: &TempDir) -> Arc<dyn StateStore> {
    Arc::new(JsonFileStore::open(dir.path()).await.unwrap())
}

#[tokio::test]
async fn inputs_survive_a_process_restart() {
    let dir = TempDir::new().unwrap();

    {
        let store = store_in(&dir).await;
        let mut controller = CalculatorController::rehydrate(VelocityCalculator, store).await;
        controller.set_field("opportunities", "120").await.unwrap();
        controller.set_field("win_rate", "25").await.unwrap();
    }

    let store = store_in(&dir).await;
    let controller = CalculatorController::rehydrate(VelocityCalculator, store).await;

    assert_eq!(controller.input().opportunities, dec!(120));
    assert_eq!(controller.input().win_rate, dec!(25));
    assert_eq!(controller.outcome(), &controller.compute(controller.input()));
}

#[tokio::test]
async fn corrupt_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir).await;
    store
        .save(&CalculatorId::PipelineVelocity.storage_key(), "[1, 2")
        .await
        .unwrap();

    let controller = CalculatorController::rehydrate(VelocityCalculator, store).await;

    assert_eq!(controller.input(), &VelocityInput::default());
}

#[tokio::test]
async fn calculators_do_not_share_state() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir).await;

    let mut velocity = CalculatorController::rehydrate(VelocityCalculator, store.clone()).await;
    velocity.set_field("deal_value", "1000").await.unwrap();
    let mut icp = CalculatorController::rehydrate(IcpCalculator, store.clone()).await;
    icp.set_field("budget", "full").await.unwrap();

    let velocity_raw = store
        .load(&CalculatorId::PipelineVelocity.storage_key())
        .await
        .unwrap()
        .unwrap();
    assert!(!velocity_raw.contains("budget"));
}

#[tokio::test]
async fn registry_opens_json_backend() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        backend: "json".to_string(),
        connection_string: dir.path().display().to_string(),
    };

    let store = StoreRegistry::with_builtin_backends()
        .create(&config)
        .await
        .unwrap();
    store.save("k", "\"v\"").await.unwrap();

    assert_eq!(store.load("k").await.unwrap(), Some("\"v\"".to_string()));
}
