use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::QuestionNumber;
use crate::model::record::TestRecord;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("unknown sort key {0:?}, expected number, accuracy or time")]
    InvalidSortKey(String),
}

//
// ─── VERDICT ──────────────────────────────────────────────────────────────────
//

/// Outcome of one question after comparing the answer with the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// No key has been entered for the question yet.
    Undetermined,
}

impl Verdict {
    /// Accuracy ordering: correct rows first, undetermined rows last.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Verdict::Correct => 1,
            Verdict::Incorrect => 2,
            Verdict::Undetermined => 3,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Correct => "Benar",
            Verdict::Incorrect => "Salah",
            Verdict::Undetermined => "Belum ditentukan",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify an answer against its key. Empty strings count as missing.
///
/// An unanswered question is always incorrect, even without a key.
#[must_use]
pub fn classify(user: Option<&str>, key: Option<&str>) -> Verdict {
    let user = user.filter(|u| !u.is_empty());
    let key = key.filter(|k| !k.is_empty());
    match (user, key) {
        (None, _) => Verdict::Incorrect,
        (Some(_), None) => Verdict::Undetermined,
        (Some(u), Some(k)) if u != k => Verdict::Incorrect,
        (Some(_), Some(_)) => Verdict::Correct,
    }
}

//
// ─── COUNTS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreCounts {
    pub correct: u32,
    pub incorrect: u32,
    pub undetermined: u32,
}

impl ScoreCounts {
    pub fn add(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Correct => self.correct += 1,
            Verdict::Incorrect => self.incorrect += 1,
            Verdict::Undetermined => self.undetermined += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct + self.incorrect + self.undetermined
    }
}

impl FromIterator<Verdict> for ScoreCounts {
    fn from_iter<I: IntoIterator<Item = Verdict>>(iter: I) -> Self {
        let mut counts = Self::default();
        for verdict in iter {
            counts.add(verdict);
        }
        counts
    }
}

//
// ─── SORTING ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Number,
    Accuracy,
    Time,
}

impl FromStr for SortBy {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "nomor" => Ok(Self::Number),
            "accuracy" | "ketepatan" => Ok(Self::Accuracy),
            "time" | "waktu" => Ok(Self::Time),
            other => Err(ReviewError::InvalidSortKey(other.to_owned())),
        }
    }
}

//
// ─── REVIEW SHEET ─────────────────────────────────────────────────────────────
//

/// One line of the review table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub question: QuestionNumber,
    pub answer: Option<String>,
    pub key: Option<String>,
    pub verdict: Verdict,
    pub seconds: u32,
}

/// Classified rows of a record, in question order, with their totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSheet {
    rows: Vec<ReviewRow>,
    counts: ScoreCounts,
}

impl ReviewSheet {
    #[must_use]
    pub fn from_record(record: &TestRecord) -> Self {
        let rows: Vec<ReviewRow> = record
            .range()
            .iter()
            .map(|question| {
                let answer = record.user_answers().get(question).cloned().flatten();
                let key = record.answer_key().get(question).cloned().flatten();
                ReviewRow {
                    question,
                    verdict: classify(answer.as_deref(), key.as_deref()),
                    answer,
                    key,
                    seconds: record
                        .time_used()
                        .per_question
                        .get(question)
                        .copied()
                        .unwrap_or(0),
                }
            })
            .collect();
        let counts = rows.iter().map(|r| r.verdict).collect();
        Self { rows, counts }
    }

    #[must_use]
    pub fn rows(&self) -> &[ReviewRow] {
        &self.rows
    }

    #[must_use]
    pub fn counts(&self) -> ScoreCounts {
        self.counts
    }

    /// Swap in a new key for one question, reclassify that row and recount.
    ///
    /// Returns the new verdict, or `None` if the question is not on the sheet.
    pub fn set_key(&mut self, question: QuestionNumber, key: Option<String>) -> Option<Verdict> {
        let row = self.rows.iter_mut().find(|r| r.question == question)?;
        row.key = key.filter(|k| !k.is_empty());
        row.verdict = classify(row.answer.as_deref(), row.key.as_deref());
        let verdict = row.verdict;
        self.counts = self.rows.iter().map(|r| r.verdict).collect();
        Some(verdict)
    }

    /// Rows ordered by `sort_by`.
    ///
    /// The ascending order is a stable sort; descending is that sequence reversed,
    /// so ties come out in reverse question order too.
    #[must_use]
    pub fn sorted(&self, sort_by: SortBy, ascending: bool) -> Vec<&ReviewRow> {
        let mut rows: Vec<&ReviewRow> = self.rows.iter().collect();
        match sort_by {
            SortBy::Number => rows.sort_by_key(|r| r.question),
            SortBy::Accuracy => rows.sort_by_key(|r| r.verdict.rank()),
            SortBy::Time => rows.sort_by_key(|r| r.seconds),
        }
        if !ascending {
            rows.reverse();
        }
        rows
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
