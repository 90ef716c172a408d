use std::path::PathBuf;
use std::sync::Arc;

use storage::repository::{Storage, StorageError};

use crate::library_service::LibraryService;
use crate::review_service::ReviewService;
use crate::sessions::SessionLoopService;
use crate::Clock;

/// Assembles app-facing services over one store.
#[derive(Clone)]
pub struct AppServices {
    session_loop: Arc<SessionLoopService>,
    review: Arc<ReviewService>,
    library: Arc<LibraryService>,
}

impl AppServices {
    /// Build services backed by the JSON store at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store file cannot be created.
    pub async fn new_json(path: impl Into<PathBuf>, clock: Clock) -> Result<Self, StorageError> {
        let storage = Storage::json_file(path).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            session_loop: Arc::new(SessionLoopService::new(clock, Arc::clone(&storage.tests))),
            review: Arc::new(ReviewService::new(Arc::clone(&storage.tests))),
            library: Arc::new(LibraryService::new(Arc::clone(&storage.tests))),
        }
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn review(&self) -> Arc<ReviewService> {
        Arc::clone(&self.review)
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }
}
