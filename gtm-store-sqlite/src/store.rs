use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gtm_core::store::{StateStore, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::debug;

/// [`StateStore`] backed by a single `calculator_state` table.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Connects with sqlx-style options; the caller decides whether the
    /// file may be created.
    pub async fn new(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// When `key` was last written, or `None` if it never was.
    pub async fn updated_at(
        &self,
        key: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT updated_at FROM calculator_state WHERE state_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(|(raw,)| parse_datetime(&raw)).transpose()
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("Failed to parse datetime '{s}': {e}")))
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM calculator_state WHERE state_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(row.map(|(value,)| value))
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO calculator_state (state_key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(state_key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        debug!(key, "saved calculator state");
        Ok(())
    }

    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM calculator_state WHERE state_key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup_test_db() -> SqliteStateStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        let store = SqliteStateStore::new_with_pool(pool);
        store.run_migrations().await.expect("Failed to run migrations");
        store
    }

    #[tokio::test]
    async fn missing_key_loads_none() {
        let store = setup_test_db().await;

        assert_eq!(store.load("gtm360:calculator:icp_score").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = setup_test_db().await;

        store.save("k", r#"{"arr":"10000000"}"#).await.unwrap();

        assert_eq!(
            store.load("k").await.unwrap(),
            Some(r#"{"arr":"10000000"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn save_overwrites_previous_value() {
        let store = setup_test_db().await;

        store.save("k", "1").await.unwrap();
        store.save("k", "2").await.unwrap();

        assert_eq!(store.load("k").await.unwrap(), Some("2".to_string()));
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM calculator_state")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn remove_deletes_and_tolerates_missing_keys() {
        let store = setup_test_db().await;
        store.save("k", "1").await.unwrap();

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();

        assert_eq!(store.load("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn updated_at_is_recorded() {
        let store = setup_test_db().await;
        let before = Utc::now();

        store.save("k", "1").await.unwrap();

        let updated = store.updated_at("k").await.unwrap().unwrap();
        assert!(updated >= before - chrono::Duration::seconds(1));
        assert_eq!(store.updated_at("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let store = setup_test_db().await;

        store.run_migrations().await.unwrap();
    }
}
