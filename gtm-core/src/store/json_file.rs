use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use super::factory::{StoreConfig, StoreFactory};
use super::state_store::{StateStore, StoreError};

/// One `<key>.json` file per key inside a directory.
///
/// Saves write a temporary sibling file and rename it over the target, so a
/// reader never observes a half-written value and concurrent writers resolve
/// last-write-wins.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    next_tmp: AtomicU64,
}

impl JsonFileStore {
    /// Opens `dir`, creating it if missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            next_tmp: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `key`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(
        &self,
        key: &str,
    ) -> PathBuf {
        let stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{stem}.json"))
    }

    fn tmp_path_for(
        &self,
        target: &Path,
    ) -> PathBuf {
        let n = self.next_tmp.fetch_add(1, Ordering::Relaxed);
        target.with_extension(format!("json.{}.{n}.tmp", std::process::id()))
    }
}

fn io_error(
    path: &Path,
    e: std::io::Error,
) -> StoreError {
    StoreError::Backend(format!("{}: {e}", path.display()))
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn save(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = self.tmp_path_for(&path);

        let written = match tokio::fs::write(&tmp, value).await {
            Ok(()) => tokio::fs::rename(&tmp, &path)
                .await
                .map_err(|e| io_error(&path, e)),
            Err(e) => Err(io_error(&tmp, e)),
        };
        if let Err(error) = written {
            // A partial write or a failed rename leaves the temp file behind.
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(error);
        }

        debug!(key, path = %path.display(), "saved state");
        Ok(())
    }

    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

/// [`StoreFactory`] for the `"json"` backend. `connection_string` is the
/// directory holding the state files.
pub struct JsonFileStoreFactory;

#[async_trait]
impl StoreFactory for JsonFileStoreFactory {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    async fn create(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<dyn StateStore>, StoreError> {
        if config.connection_string.trim().is_empty() {
            return Err(StoreError::Configuration(
                "json backend requires a directory as connection_string".to_string(),
            ));
        }
        let store = JsonFileStore::open(&config.connection_string).await?;
        Ok(Arc::new(store))
    }
}
