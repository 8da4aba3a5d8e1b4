//! The sqlite backend plugged into the core registry and driven by a
//! calculator controller.

use gtm_core::calculations::QuotaCliffCalculator;
use gtm_core::store::{StoreConfig, StoreRegistry};
use gtm_core::CalculatorController;
use gtm_store_sqlite::SqliteStoreFactory;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn registry() -> StoreRegistry {
    let mut registry = StoreRegistry::with_builtin_backends();
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

#[test]
fn sqlite_is_listed_alongside_builtin_backends() {
    assert_eq!(registry().available_backends(), vec!["json", "memory", "sqlite"]);
}

#[tokio::test]
async fn controller_state_persists_in_database_file() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig {
        backend: "sqlite".to_string(),
        connection_string: dir.path().join("gtm360.db").display().to_string(),
    };

    {
        let store = registry().create(&config).await.unwrap();
        let mut controller = CalculatorController::rehydrate(QuotaCliffCalculator, store).await;
        controller.set_field("hiring_plan", "4").await.unwrap();
    }

    let store = registry().create(&config).await.unwrap();
    let controller = CalculatorController::rehydrate(QuotaCliffCalculator, store).await;

    assert_eq!(controller.input().hiring_plan, dec!(4));
}
