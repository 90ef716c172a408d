use std::sync::{Arc, Mutex};

use alum_core::model::TestStore;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Repository contract for the saved-test store.
///
/// The store is small and always handled whole: callers read it, apply one change
/// and write it back.
#[async_trait]
pub trait TestStoreRepository: Send + Sync {
    /// Load every saved test in list order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read or decoded.
    async fn read_store(&self) -> Result<TestStore, StorageError>;

    /// Replace the persisted store with `store`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be encoded or written.
    async fn write_store(&self, store: &TestStore) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<Mutex<TestStore>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(store: TestStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

#[async_trait]
impl TestStoreRepository for InMemoryRepository {
    async fn read_store(&self) -> Result<TestStore, StorageError> {
        let guard = self
            .store
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn write_store(&self, store: &TestStore) -> Result<(), StorageError> {
        let mut guard = self
            .store
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = store.clone();
        Ok(())
    }
}

/// Aggregates the repositories used by services.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestStoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            tests: Arc::new(InMemoryRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alum_core::model::{
        AnswerOptions, QuestionMap, QuestionNumber, QuestionRange, RecordSettings, TestRecord,
        TimeLimit, TimeUsed,
    };
    use alum_core::time::fixed_now;

    fn build_record() -> TestRecord {
        let range = QuestionRange::new(QuestionNumber::new(1), 2);
        TestRecord::from_persisted(
            RecordSettings {
                time_limit: TimeLimit::Untimed,
                range,
                options: AnswerOptions::default(),
            },
            QuestionMap::filled(range, Some("A".into())),
            QuestionMap::filled(range, None),
            TimeUsed {
                total_secs: 4,
                per_question: QuestionMap::filled(range, 2),
            },
            fixed_now().naive_utc(),
            String::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn in_memory_round_trips_whole_store() {
        let repo = InMemoryRepository::new();
        assert!(repo.read_store().await.unwrap().is_empty());

        let mut store = TestStore::new();
        store.insert_new("b", build_record()).unwrap();
        store.insert_new("a", build_record()).unwrap();
        repo.write_store(&store).await.unwrap();

        let loaded = repo.read_store().await.unwrap();
        assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(loaded, store);
    }

    #[tokio::test]
    async fn storage_handle_shares_backend() {
        let storage = Storage::in_memory();
        let clone = storage.clone();

        let mut store = TestStore::new();
        store.insert_new("t1", build_record()).unwrap();
        storage.tests.write_store(&store).await.unwrap();

        assert!(clone.tests.read_store().await.unwrap().contains("t1"));
    }
}
