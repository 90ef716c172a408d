use std::path::{Path, PathBuf};

use alum_core::model::TestStore;
use async_trait::async_trait;
use log::{debug, info};

use crate::repository::{Storage, StorageError, TestStoreRepository};

mod mapping;

/// Saved tests kept in a single pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Open the store at `path`, creating an empty `{}` document if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the file or its directory cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if !tokio::fs::try_exists(&path).await? {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, "{}").await?;
            info!("created empty test store at {}", path.display());
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TestStoreRepository for JsonFileRepository {
    async fn read_store(&self) -> Result<TestStore, StorageError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let raw: mapping::PersistedStore = serde_json::from_str(&text)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let store = mapping::store_from_persisted(raw)?;
        debug!("read {} saved tests from {}", store.len(), self.path.display());
        Ok(store)
    }

    async fn write_store(&self, store: &TestStore) -> Result<(), StorageError> {
        let raw = mapping::store_to_persisted(store);
        let text = serde_json::to_string_pretty(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // written beside the target, then renamed over it
        let scratch = self.scratch_path();
        tokio::fs::write(&scratch, text).await?;
        tokio::fs::rename(&scratch, &self.path).await?;
        debug!("wrote {} saved tests to {}", store.len(), self.path.display());
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file cannot be created.
    pub async fn json_file(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let repo = JsonFileRepository::open(path).await?;
        Ok(Self {
            tests: std::sync::Arc::new(repo),
        })
    }
}
