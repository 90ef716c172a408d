use std::sync::Arc;

use chrono::NaiveDateTime;
use log::{info, warn};

use alum_core::model::{DragGesture, QuestionRange, ScoreCounts, StoreError, TestRecord};
use storage::repository::TestStoreRepository;

use crate::error::LibraryError;

/// Presentation-agnostic list item for a saved test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestListItem {
    pub name: String,
    pub taken_at: NaiveDateTime,
    pub range: QuestionRange,
    pub counts: ScoreCounts,
    pub total_secs: u32,
}

impl TestListItem {
    #[must_use]
    pub fn from_record(name: &str, record: &TestRecord) -> Self {
        Self {
            name: name.to_owned(),
            taken_at: record.taken_at(),
            range: record.range(),
            counts: record.counts(),
            total_secs: record.time_used().total_secs,
        }
    }
}

/// The saved-test list: naming, deleting and ordering.
#[derive(Clone)]
pub struct LibraryService {
    tests: Arc<dyn TestStoreRepository>,
}

impl LibraryService {
    #[must_use]
    pub fn new(tests: Arc<dyn TestStoreRepository>) -> Self {
        Self { tests }
    }

    /// Saved tests in list order.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` on read failures.
    pub async fn list(&self) -> Result<Vec<TestListItem>, LibraryError> {
        let store = self.tests.read_store().await?;
        Ok(store
            .iter()
            .map(|(name, record)| TestListItem::from_record(name, record))
            .collect())
    }

    /// Fetch one saved test.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Store` if the name is unknown.
    pub async fn get(&self, name: &str) -> Result<TestRecord, LibraryError> {
        let store = self.tests.read_store().await?;
        store
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(name.to_owned()).into())
    }

    /// Rename a test without moving it in the list. Returns the stored name.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Store` for unknown, blank or taken names.
    pub async fn rename(&self, old: &str, new: &str) -> Result<String, LibraryError> {
        let mut store = self.tests.read_store().await?;
        let renamed = store
            .rename(old, new)
            .inspect_err(|e| warn!("rename of {old:?} refused: {e}"))?;
        if renamed != old {
            self.tests.write_store(&store).await?;
            info!("renamed {old:?} to {renamed:?}");
        }
        Ok(renamed)
    }

    /// Delete a test.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Store` if the name is unknown.
    pub async fn delete(&self, name: &str) -> Result<(), LibraryError> {
        let mut store = self.tests.read_store().await?;
        store.remove(name)?;
        self.tests.write_store(&store).await?;
        info!("deleted {name:?}");
        Ok(())
    }

    /// Move the test at `from` to position `to`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Store` for positions past the end of the list.
    pub async fn move_test(&self, from: usize, to: usize) -> Result<(), LibraryError> {
        let mut store = self.tests.read_store().await?;
        store.move_entry(from, to)?;
        if from != to {
            self.tests.write_store(&store).await?;
            info!("moved test {from} -> {to}");
        }
        Ok(())
    }

    /// Drop a dragged test at the pointer position. Returns its new position.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Store` if the drag started past the end of the list.
    pub async fn drag_test(&self, gesture: &DragGesture) -> Result<usize, LibraryError> {
        let mut store = self.tests.read_store().await?;
        let to = store.apply_drop(gesture)?;
        if to != gesture.prev_index {
            self.tests.write_store(&store).await?;
            info!("dragged test {} -> {to}", gesture.prev_index);
        }
        Ok(to)
    }
}
