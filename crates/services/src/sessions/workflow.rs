use std::sync::Arc;

use log::info;

use alum_core::model::{AnswerKeySheet, ScoreCounts, TestRecord, TestSettingsDraft, normalize_name};
use storage::repository::TestStoreRepository;

use super::service::{FinishedTest, SessionService};
use crate::Clock;
use crate::error::SessionError;

/// Outcome of saving a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTest {
    pub name: String,
    pub counts: ScoreCounts,
}

/// Orchestrates starting an attempt and saving its result.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    tests: Arc<dyn TestStoreRepository>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, tests: Arc<dyn TestStoreRepository>) -> Self {
        Self { clock, tests }
    }

    /// Validate the settings and start a running session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Settings` for invalid drafts.
    pub fn start(&self, draft: TestSettingsDraft) -> Result<SessionService, SessionError> {
        let settings = draft.validate()?;
        SessionService::start(self.clock, settings)
    }

    /// Attach the answer key and store the result under `name`.
    ///
    /// A blank name falls back to the attempt's timestamp, suffixed until unique. A
    /// non-blank name that is already used is refused before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` for taken names, `SessionError::Record` if the key
    /// does not fit the attempt, or `SessionError::Storage` on read/write failures.
    pub async fn save_result(
        &self,
        finished: FinishedTest,
        answer_key: AnswerKeySheet,
        name: Option<&str>,
    ) -> Result<SavedTest, SessionError> {
        let record = TestRecord::from_outcome(
            finished.outcome,
            answer_key.into_keys(),
            finished.finished_at,
        )?;
        let counts = record.counts();

        let mut store = self.tests.read_store().await?;
        let name = match name.and_then(normalize_name) {
            Some(name) => name,
            None => store.unique_default_name(&record.taken_at_text()),
        };
        let name = store.insert_new(&name, record)?;
        self.tests.write_store(&store).await?;

        info!(
            "saved test {name:?}: {} correct, {} incorrect, {} undetermined",
            counts.correct, counts.incorrect, counts.undetermined
        );
        Ok(SavedTest { name, counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alum_core::model::{QuestionNumber, StoreError};
    use alum_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn draft() -> TestSettingsDraft {
        TestSettingsDraft {
            question_count: 2,
            option_count: 2,
            ..TestSettingsDraft::default()
        }
    }

    fn finished(loop_svc: &SessionLoopService) -> FinishedTest {
        let mut session = loop_svc.start(draft()).unwrap();
        session.select_answer(QuestionNumber::new(1), "A");
        session.finish(false).unwrap()
    }

    #[tokio::test]
    async fn blank_names_fall_back_to_timestamp() {
        let repo = Arc::new(InMemoryRepository::new());
        let loop_svc = SessionLoopService::new(fixed_clock(), repo.clone());

        let first = finished(&loop_svc);
        let sheet = first.answer_key_sheet();
        let saved = loop_svc.save_result(first, sheet, Some("  ")).await.unwrap();
        assert_eq!(saved.name, "14/11/2023, 22:13:20");

        let second = finished(&loop_svc);
        let sheet = second.answer_key_sheet();
        let saved = loop_svc.save_result(second, sheet, None).await.unwrap();
        assert_eq!(saved.name, "14/11/2023, 22:13:20 (1)");

        let store = repo.read_store().await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn taken_name_is_rejected_without_writing() {
        let repo = Arc::new(InMemoryRepository::new());
        let loop_svc = SessionLoopService::new(fixed_clock(), repo.clone());

        let attempt = finished(&loop_svc);
        let sheet = attempt.answer_key_sheet();
        loop_svc
            .save_result(attempt.clone(), sheet.clone(), Some("TO 1"))
            .await
            .unwrap();

        let err = loop_svc
            .save_result(attempt, sheet, Some("TO 1 "))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::NameTaken(_))));
        assert_eq!(repo.read_store().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn counts_reflect_answer_key() {
        let repo = Arc::new(InMemoryRepository::new());
        let loop_svc = SessionLoopService::new(fixed_clock(), repo);

        let attempt = finished(&loop_svc);
        let mut sheet = attempt.answer_key_sheet();
        sheet.choose(QuestionNumber::new(1), "A").unwrap();
        let saved = loop_svc.save_result(attempt, sheet, Some("x")).await.unwrap();
        assert_eq!(saved.counts.correct, 1);
        assert_eq!(saved.counts.incorrect, 1);
    }

    #[test]
    fn invalid_draft_is_refused() {
        let loop_svc = SessionLoopService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let bad = TestSettingsDraft {
            question_count: 0,
            ..TestSettingsDraft::default()
        };
        assert!(matches!(loop_svc.start(bad), Err(SessionError::Settings(_))));
    }
}
