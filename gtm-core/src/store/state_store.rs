use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// String key-value storage for raw calculator inputs.
///
/// Values are opaque JSON documents. Concurrent writers to the same key
/// resolve last-write-wins; no backend merges values.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>, StoreError>;

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), StoreError>;
}

/// Loads and deserializes `key`, falling back to `T::default()` when the key
/// is missing, the store fails, or the stored value does not parse.
pub async fn load_or_default<T>(
    store: &dyn StateStore,
    key: &str,
) -> T
where
    T: DeserializeOwned + Default,
{
    match store.load(key).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "stored state is corrupt, using defaults");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "state store unavailable, using defaults");
            T::default()
        }
    }
}

/// Serializes `value` as JSON and writes it under `key`.
pub async fn save_value<T>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError>
where
    T: Serialize + Sync,
{
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    store.save(key, &raw).await
}
