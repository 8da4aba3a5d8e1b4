use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::factory::{StoreConfig, StoreFactory};
use super::state_store::{StateStore, StoreError};

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// [`StoreFactory`] for the `"memory"` backend. Each `create` returns a fresh,
/// empty store.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &StoreConfig,
    ) -> Result<Arc<dyn StateStore>, StoreError> {
        Ok(Arc::new(MemoryStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn load_missing_key_is_none() {
        let store = MemoryStore::new();

        assert_eq!(store.load("gtm360:calculator:rule_of_40").await, Ok(None));
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryStore::new();

        store.save("k", "first").await.unwrap();
        store.save("k", "second").await.unwrap();

        assert_eq!(store.load("k").await, Ok(Some("second".to_string())));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new();
        store.save("k", "v").await.unwrap();

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();

        assert!(store.is_empty());
    }
}
