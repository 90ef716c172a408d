use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::ids::{QuestionNumber, QuestionRange};
use crate::model::question_map::QuestionMap;
use crate::model::review::{ScoreCounts, Verdict, classify};
use crate::model::session::SessionOutcome;
use crate::model::settings::{AnswerOptions, TimeLimit};

/// `tanggal_tes` layout, e.g. `14/11/2023, 22:13:20`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("{field} does not cover questions {range}")]
    CoverageMismatch { field: &'static str, range: String },

    #[error("question {0} is not part of this test")]
    QuestionOutOfRange(QuestionNumber),

    #[error("option {label:?} for question {question} is not one of this test's options")]
    UnknownOption {
        question: QuestionNumber,
        label: String,
    },

    #[error("first question number {first} is not allowed")]
    InvalidFirstQuestion { first: u32 },
}

//
// ─── ANSWER KEY SHEET ──────────────────────────────────────────────────────────
//

/// Answer key being filled in right after a test ends.
///
/// Choosing the selected option a second time clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKeySheet {
    options: AnswerOptions,
    keys: QuestionMap<Option<String>>,
}

impl AnswerKeySheet {
    #[must_use]
    pub fn new(range: QuestionRange, options: AnswerOptions) -> Self {
        Self {
            options,
            keys: QuestionMap::filled(range, None),
        }
    }

    #[must_use]
    pub fn for_outcome(outcome: &SessionOutcome) -> Self {
        Self::new(outcome.settings.range(), outcome.settings.options().clone())
    }

    /// Toggle `label` as the key of `question`; returns the key now in place.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` for unknown questions or labels.
    pub fn choose(
        &mut self,
        question: QuestionNumber,
        label: &str,
    ) -> Result<Option<&str>, RecordError> {
        if !self.options.contains(label) {
            return Err(RecordError::UnknownOption {
                question,
                label: label.to_owned(),
            });
        }
        let slot = self
            .keys
            .get_mut(question)
            .ok_or(RecordError::QuestionOutOfRange(question))?;

        if slot.as_deref() == Some(label) {
            *slot = None;
        } else {
            *slot = Some(label.to_owned());
        }
        Ok(slot.as_deref())
    }

    #[must_use]
    pub fn key(&self, question: QuestionNumber) -> Option<&str> {
        self.keys.get(question).and_then(Option::as_deref)
    }

    /// Questions that still have no key.
    #[must_use]
    pub fn unset(&self) -> Vec<QuestionNumber> {
        self.keys
            .iter()
            .filter(|(_, k)| k.is_none())
            .map(|(q, _)| q)
            .collect()
    }

    #[must_use]
    pub fn options(&self) -> &AnswerOptions {
        &self.options
    }

    #[must_use]
    pub fn into_keys(self) -> QuestionMap<Option<String>> {
        self.keys
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// Settings snapshot stored with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSettings {
    pub time_limit: TimeLimit,
    pub range: QuestionRange,
    pub options: AnswerOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeUsed {
    pub total_secs: u32,
    pub per_question: QuestionMap<u32>,
}

/// A finished, reviewable test result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    settings: RecordSettings,
    user_answers: QuestionMap<Option<String>>,
    answer_key: QuestionMap<Option<String>>,
    time_used: TimeUsed,
    taken_at: NaiveDateTime,
    note: String,
}

impl TestRecord {
    /// Turn a finished session plus its answer key into a record.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if the key does not match the session's questions.
    pub fn from_outcome(
        outcome: SessionOutcome,
        answer_key: QuestionMap<Option<String>>,
        taken_at: NaiveDateTime,
    ) -> Result<Self, RecordError> {
        let settings = RecordSettings {
            time_limit: outcome.settings.time_limit(),
            range: outcome.settings.range(),
            options: outcome.settings.options().clone(),
        };
        Self::from_persisted(
            settings,
            outcome.answers,
            answer_key,
            TimeUsed {
                total_secs: outcome.total_used_secs,
                per_question: outcome.per_question_secs,
            },
            taken_at,
            String::new(),
        )
    }

    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::CoverageMismatch` if a per-question map does not cover the
    /// range exactly, or `RecordError::UnknownOption` for labels outside the options.
    pub fn from_persisted(
        settings: RecordSettings,
        user_answers: QuestionMap<Option<String>>,
        answer_key: QuestionMap<Option<String>>,
        time_used: TimeUsed,
        taken_at: NaiveDateTime,
        note: String,
    ) -> Result<Self, RecordError> {
        let range = settings.range;
        let coverage = [
            ("jawaban_tes", user_answers.covers(range)),
            ("kunci_jawaban", answer_key.covers(range)),
            ("per_soal", time_used.per_question.covers(range)),
        ];
        for (field, covered) in coverage {
            if !covered {
                return Err(RecordError::CoverageMismatch {
                    field,
                    range: range.to_string(),
                });
            }
        }

        for (question, label) in user_answers.iter().chain(answer_key.iter()) {
            if let Some(label) = label {
                if !settings.options.contains(label) {
                    return Err(RecordError::UnknownOption {
                        question,
                        label: label.clone(),
                    });
                }
            }
        }

        Ok(Self {
            settings,
            user_answers,
            answer_key,
            time_used,
            taken_at,
            note,
        })
    }

    // Accessors
    #[must_use]
    pub fn settings(&self) -> &RecordSettings {
        &self.settings
    }

    #[must_use]
    pub fn range(&self) -> QuestionRange {
        self.settings.range
    }

    #[must_use]
    pub fn user_answers(&self) -> &QuestionMap<Option<String>> {
        &self.user_answers
    }

    #[must_use]
    pub fn answer_key(&self) -> &QuestionMap<Option<String>> {
        &self.answer_key
    }

    #[must_use]
    pub fn time_used(&self) -> &TimeUsed {
        &self.time_used
    }

    #[must_use]
    pub fn taken_at(&self) -> NaiveDateTime {
        self.taken_at
    }

    #[must_use]
    pub fn taken_at_text(&self) -> String {
        self.taken_at.format(TIMESTAMP_FORMAT).to_string()
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    #[must_use]
    pub fn verdict(&self, question: QuestionNumber) -> Option<Verdict> {
        let user = self.user_answers.get(question)?;
        let key = self.answer_key.get(question)?;
        Some(classify(user.as_deref(), key.as_deref()))
    }

    #[must_use]
    pub fn counts(&self) -> ScoreCounts {
        self.range()
            .iter()
            .filter_map(|q| self.verdict(q))
            .collect()
    }

    /// Replace one answer key entry (`None` clears it) and return its new verdict.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` for questions outside the test or unknown labels.
    pub fn set_answer_key(
        &mut self,
        question: QuestionNumber,
        label: Option<String>,
    ) -> Result<Verdict, RecordError> {
        if let Some(label) = &label {
            if !self.settings.options.contains(label) {
                return Err(RecordError::UnknownOption {
                    question,
                    label: label.clone(),
                });
            }
        }
        self.answer_key
            .replace(question, label)
            .ok_or(RecordError::QuestionOutOfRange(question))?;
        self.verdict(question)
            .ok_or(RecordError::QuestionOutOfRange(question))
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Relabel the questions so the test starts at `new_first`.
    ///
    /// Answers, key and per-question times move together. Returns `Ok(false)` when
    /// `new_first` is already the first question.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::InvalidFirstQuestion` if any shifted number would be
    /// below 1; the record is left untouched.
    pub fn change_first_question(&mut self, new_first: QuestionNumber) -> Result<bool, RecordError> {
        let old_first = self.settings.range.first();
        if new_first == old_first {
            return Ok(false);
        }
        let invalid = || RecordError::InvalidFirstQuestion {
            first: new_first.value(),
        };
        if new_first.value() == 0 {
            return Err(invalid());
        }

        let delta = i64::from(new_first.value()) - i64::from(old_first.value());
        let user_answers = self.user_answers.shifted(delta).ok_or_else(invalid)?;
        let answer_key = self.answer_key.shifted(delta).ok_or_else(invalid)?;
        let per_question = self
            .time_used
            .per_question
            .shifted(delta)
            .ok_or_else(invalid)?;

        self.user_answers = user_answers;
        self.answer_key = answer_key;
        self.time_used.per_question = per_question;
        self.settings.range = self.settings.range.with_first(new_first);
        Ok(true)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
