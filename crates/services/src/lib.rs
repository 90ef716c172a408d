#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod library_service;
pub mod review_service;
pub mod sessions;

pub use alum_core::Clock;

pub use app_services::AppServices;
pub use error::{LibraryError, ReviewServiceError, SessionError};
pub use library_service::{LibraryService, TestListItem};
pub use review_service::{ReviewService, TestReview};

pub use sessions::{FinishedTest, SavedTest, SessionLoopService, SessionService, SessionView};
