use std::sync::Arc;

use async_trait::async_trait;
use gtm_core::store::{StateStore, StoreConfig, StoreError, StoreFactory};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::store::SqliteStateStore;

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`gtm_core::store::StoreRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use gtm_core::store::StoreRegistry;
/// use gtm_store_sqlite::SqliteStoreFactory;
///
/// let mut registry = StoreRegistry::with_builtin_backends();
/// registry.register(Box::new(SqliteStoreFactory));
/// ```
pub struct SqliteStoreFactory;

#[async_trait]
impl StoreFactory for SqliteStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"gtm360.db"`. The file is created if it
    ///   does not exist.
    /// * `":memory:"`, an ephemeral database held by a single connection.
    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn StateStore>, StoreError> {
        let target = config.connection_string.trim();
        if target.is_empty() {
            return Err(StoreError::Configuration(
                "sqlite backend needs a file path or ':memory:'".to_string(),
            ));
        }

        let store = if target == ":memory:" {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            SqliteStateStore::new_with_pool(pool)
        } else {
            let options = SqliteConnectOptions::new()
                .filename(target)
                .create_if_missing(true);
            SqliteStateStore::new(options).await?
        };
        store.run_migrations().await?;

        info!(database = target, "opened sqlite state store");
        Ok(Arc::new(store))
    }
}
