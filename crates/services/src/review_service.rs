use std::sync::Arc;

use log::{info, warn};

use alum_core::model::{
    QuestionNumber, ReviewRow, ReviewSheet, SortBy, StoreError, TestRecord, Verdict,
};
use storage::repository::TestStoreRepository;

use crate::error::ReviewServiceError;

//
// ─── REVIEW ────────────────────────────────────────────────────────────────────
//

/// One saved test opened for review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReview {
    pub name: String,
    pub record: TestRecord,
    pub sheet: ReviewSheet,
}

impl TestReview {
    fn new(name: &str, record: TestRecord) -> Self {
        let sheet = ReviewSheet::from_record(&record);
        Self {
            name: name.to_owned(),
            record,
            sheet,
        }
    }

    #[must_use]
    pub fn rows(&self, sort_by: SortBy, ascending: bool) -> Vec<&ReviewRow> {
        self.sheet.sorted(sort_by, ascending)
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Review-window operations. Every edit re-reads the store, applies one change and
/// writes the whole store back.
#[derive(Clone)]
pub struct ReviewService {
    tests: Arc<dyn TestStoreRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(tests: Arc<dyn TestStoreRepository>) -> Self {
        Self { tests }
    }

    /// Load a saved test and classify its answers.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Store` if the name is unknown.
    pub async fn open(&self, name: &str) -> Result<TestReview, ReviewServiceError> {
        let store = self.tests.read_store().await?;
        let record = store
            .get(name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        Ok(TestReview::new(name, record.clone()))
    }

    /// Replace (or clear with `None`) the key of one question of an open review.
    ///
    /// The stored record is edited and written back first. The review then takes the
    /// stored record, and its sheet reclassifies only that row and recounts. If the
    /// stored record had changed since the review was opened, the sheet is rebuilt.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` for unknown tests, questions or labels, and
    /// storage failures. The review is untouched on error.
    pub async fn set_answer_key(
        &self,
        review: &mut TestReview,
        question: QuestionNumber,
        label: Option<&str>,
    ) -> Result<Verdict, ReviewServiceError> {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned);
        let name = review.name.as_str();

        let mut store = self.tests.read_store().await?;
        let record = store.require_mut(name)?;
        let stale = *record != review.record;
        let verdict = record
            .set_answer_key(question, label.clone())
            .inspect_err(|e| warn!("answer key edit on {name:?} refused: {e}"))?;
        let updated = record.clone();
        self.tests.write_store(&store).await?;
        info!("answer key of {name:?} question {question} set to {label:?}: {verdict}");

        review.record = updated;
        if stale {
            review.sheet = ReviewSheet::from_record(&review.record);
            return Ok(verdict);
        }
        Ok(review.sheet.set_key(question, label).unwrap_or(verdict))
    }

    /// Replace the free-text note.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` for unknown tests or storage failures.
    pub async fn set_note(&self, name: &str, note: &str) -> Result<(), ReviewServiceError> {
        let mut store = self.tests.read_store().await?;
        store.require_mut(name)?.set_note(note);
        self.tests.write_store(&store).await?;
        info!("note of {name:?} updated");
        Ok(())
    }

    /// Relabel a test's questions to start at `new_first`.
    ///
    /// Returns `false` (and writes nothing) when it already starts there.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError` for unknown tests, invalid numbers or storage
    /// failures.
    pub async fn change_first_question(
        &self,
        name: &str,
        new_first: QuestionNumber,
    ) -> Result<bool, ReviewServiceError> {
        let mut store = self.tests.read_store().await?;
        let changed = store.require_mut(name)?.change_first_question(new_first)?;
        if changed {
            self.tests.write_store(&store).await?;
            info!("questions of {name:?} now start at {new_first}");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alum_core::model::{
        AnswerOptions, QuestionMap, QuestionRange, RecordError, RecordSettings, TestStore,
        TimeLimit, TimeUsed,
    };
    use alum_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn q(n: u32) -> QuestionNumber {
        QuestionNumber::new(n)
    }

    fn seeded() -> (Arc<InMemoryRepository>, ReviewService) {
        let range = QuestionRange::new(q(1), 3);
        let answers = [Some("A"), None, Some("B")]
            .into_iter()
            .zip(range.iter())
            .map(|(a, q)| (q, a.map(str::to_owned)))
            .collect();
        let key = [Some("A"), Some("B"), Some("C")]
            .into_iter()
            .zip(range.iter())
            .map(|(k, q)| (q, k.map(str::to_owned)))
            .collect();
        let record = TestRecord::from_persisted(
            RecordSettings {
                time_limit: TimeLimit::Untimed,
                range,
                options: AnswerOptions::first_n(3).unwrap(),
            },
            answers,
            key,
            TimeUsed {
                total_secs: 30,
                per_question: QuestionMap::filled(range, 10),
            },
            fixed_now().naive_utc(),
            String::new(),
        )
        .unwrap();

        let mut store = TestStore::new();
        store.insert_new("TO 1", record).unwrap();
        let repo = Arc::new(InMemoryRepository::with_store(store));
        (repo.clone(), ReviewService::new(repo))
    }

    #[tokio::test]
    async fn open_classifies_rows() {
        let (_, svc) = seeded();
        let review = svc.open("TO 1").await.unwrap();
        let counts = review.sheet.counts();
        assert_eq!((counts.correct, counts.incorrect, counts.undetermined), (1, 2, 0));

        let rows = review.rows(SortBy::Accuracy, true);
        assert_eq!(rows[0].question, q(1));

        assert!(matches!(
            svc.open("missing").await,
            Err(ReviewServiceError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn key_edit_updates_review_and_store() {
        let (repo, svc) = seeded();
        let mut review = svc.open("TO 1").await.unwrap();
        let before_q2 = review.sheet.rows()[1].clone();

        assert_eq!(
            svc.set_answer_key(&mut review, q(3), Some("B")).await.unwrap(),
            Verdict::Correct
        );
        assert_eq!(
            svc.set_answer_key(&mut review, q(1), None).await.unwrap(),
            Verdict::Undetermined
        );

        let counts = review.sheet.counts();
        assert_eq!((counts.correct, counts.incorrect, counts.undetermined), (1, 1, 1));
        assert_eq!(review.sheet.rows()[1], before_q2);
        assert_eq!(review.sheet.rows()[2].key.as_deref(), Some("B"));
        assert_eq!(review.sheet, ReviewSheet::from_record(&review.record));

        let store = repo.read_store().await.unwrap();
        assert_eq!(store.get("TO 1").unwrap(), &review.record);

        let snapshot = review.clone();
        assert!(matches!(
            svc.set_answer_key(&mut review, q(1), Some("Z")).await,
            Err(ReviewServiceError::Record(RecordError::UnknownOption { .. }))
        ));
        assert_eq!(review, snapshot);
    }

    #[tokio::test]
    async fn key_edit_picks_up_changes_made_elsewhere() {
        let (_, svc) = seeded();
        let mut stale = svc.open("TO 1").await.unwrap();
        let mut fresh = svc.open("TO 1").await.unwrap();
        svc.set_answer_key(&mut fresh, q(2), None).await.unwrap();

        svc.set_answer_key(&mut stale, q(3), Some("B")).await.unwrap();
        assert_eq!(stale.sheet.rows()[1].key, None);
        assert_eq!(stale.sheet, ReviewSheet::from_record(&stale.record));
        assert_eq!(stale.sheet.counts().correct, 2);
    }

    #[tokio::test]
    async fn renumber_and_note() {
        let (repo, svc) = seeded();
        assert!(svc.change_first_question("TO 1", q(21)).await.unwrap());
        assert!(!svc.change_first_question("TO 1", q(21)).await.unwrap());
        svc.set_note("TO 1", "ulang bab 2").await.unwrap();

        let review = svc.open("TO 1").await.unwrap();
        assert_eq!(review.record.range().to_string(), "21 - 23");
        assert_eq!(review.record.note(), "ulang bab 2");
        assert_eq!(review.sheet.counts().correct, 1);
        assert_eq!(
            repo.read_store().await.unwrap().get("TO 1").unwrap().range().first(),
            q(21)
        );
    }
}
