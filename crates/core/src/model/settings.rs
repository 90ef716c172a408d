use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::ids::{QuestionNumber, QuestionRange};

//
// ─── LIMITS ────────────────────────────────────────────────────────────────────
//

/// Labels offered by the settings screen, in order.
pub const OPTION_ALPHABET: [&str; 11] = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K"];

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;
pub const DEFAULT_OPTION_COUNT: usize = 5;

pub const MAX_QUESTIONS: u32 = 999;
pub const DEFAULT_QUESTION_COUNT: u32 = 10;

pub const MAX_FIRST_QUESTION: u32 = 9_999;

pub const MAX_TIME_LIMIT_MINUTES: u32 = 999;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be between 1 and 999, got {count}")]
    InvalidQuestionCount { count: u32 },

    #[error("first question number must be between 1 and 9999, got {first}")]
    InvalidFirstQuestion { first: u32 },

    #[error("option count must be between 2 and 10, got {count}")]
    InvalidOptionCount { count: usize },

    #[error("option labels cannot be empty")]
    EmptyOption,

    #[error("option label {0:?} is listed twice")]
    DuplicateOption(String),

    #[error("time limit must be at most 999 minutes, got {minutes}")]
    InvalidTimeLimit { minutes: u32 },
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// Ordered, distinct answer labels of a test (e.g. "A".."E").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOptions(Vec<String>);

impl AnswerOptions {
    /// Validate a custom label list.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for empty or duplicate labels, or a count outside 2..=10.
    pub fn new<I, S>(labels: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(|label| label.into().trim().to_owned())
            .collect();

        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&labels.len()) {
            return Err(SettingsError::InvalidOptionCount {
                count: labels.len(),
            });
        }

        let mut seen = HashSet::new();
        for label in &labels {
            if label.is_empty() {
                return Err(SettingsError::EmptyOption);
            }
            if !seen.insert(label.as_str()) {
                return Err(SettingsError::DuplicateOption(label.clone()));
            }
        }

        Ok(Self(labels))
    }

    /// The first `count` letters of [`OPTION_ALPHABET`].
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidOptionCount` if `count` is outside 2..=10.
    pub fn first_n(count: usize) -> Result<Self, SettingsError> {
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            return Err(SettingsError::InvalidOptionCount { count });
        }
        Self::new(OPTION_ALPHABET.iter().take(count).copied())
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|l| l == label)
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self(
            OPTION_ALPHABET
                .iter()
                .take(DEFAULT_OPTION_COUNT)
                .map(|l| (*l).to_owned())
                .collect(),
        )
    }
}

impl fmt::Display for AnswerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

//
// ─── TIME LIMIT ────────────────────────────────────────────────────────────────
//

/// Whole-test time budget. Untimed tests count up instead of down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLimit {
    #[default]
    Untimed,
    Minutes(u32),
}

impl TimeLimit {
    /// Zero minutes means untimed.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        if minutes == 0 {
            Self::Untimed
        } else {
            Self::Minutes(minutes)
        }
    }

    /// Persisted form counts seconds. `None` unless `secs` is a whole number of
    /// minutes within the limit.
    #[must_use]
    pub fn from_secs(secs: u32) -> Option<Self> {
        if secs % 60 != 0 || secs / 60 > MAX_TIME_LIMIT_MINUTES {
            return None;
        }
        Some(Self::from_minutes(secs / 60))
    }

    #[must_use]
    pub fn minutes(&self) -> u32 {
        match self {
            Self::Untimed => 0,
            Self::Minutes(m) => *m,
        }
    }

    #[must_use]
    pub fn as_secs(&self) -> u32 {
        self.minutes().saturating_mul(60)
    }

    #[must_use]
    pub fn is_untimed(&self) -> bool {
        matches!(self, Self::Untimed)
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Presentation toggles chosen before a test starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DisplaySettings {
    pub show_total_time: bool,
    pub show_question_time: bool,
    pub show_doubt_buttons: bool,
    /// Jump to the next question right after an answer is chosen.
    pub auto_advance: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_total_time: false,
            show_question_time: false,
            show_doubt_buttons: true,
            auto_advance: false,
        }
    }
}

/// Validated configuration of one test attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSettings {
    time_limit: TimeLimit,
    range: QuestionRange,
    options: AnswerOptions,
    display: DisplaySettings,
}

impl TestSettings {
    #[must_use]
    pub fn time_limit(&self) -> TimeLimit {
        self.time_limit
    }

    #[must_use]
    pub fn range(&self) -> QuestionRange {
        self.range
    }

    #[must_use]
    pub fn first_question(&self) -> QuestionNumber {
        self.range.first()
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.range.len()
    }

    #[must_use]
    pub fn options(&self) -> &AnswerOptions {
        &self.options
    }

    #[must_use]
    pub fn display(&self) -> DisplaySettings {
        self.display
    }
}

/// Raw settings as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSettingsDraft {
    /// 0 means untimed.
    pub time_limit_minutes: u32,
    pub first_question: u32,
    pub question_count: u32,
    pub option_count: usize,
    /// Custom labels; when set, `option_count` is ignored.
    pub options: Option<Vec<String>>,
    pub display: DisplaySettings,
}

impl Default for TestSettingsDraft {
    fn default() -> Self {
        Self {
            time_limit_minutes: 0,
            first_question: 1,
            question_count: DEFAULT_QUESTION_COUNT,
            option_count: DEFAULT_OPTION_COUNT,
            options: None,
            display: DisplaySettings::default(),
        }
    }
}

impl TestSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft into settings a session can start from.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any field is outside its allowed range.
    pub fn validate(self) -> Result<TestSettings, SettingsError> {
        if !(1..=MAX_QUESTIONS).contains(&self.question_count) {
            return Err(SettingsError::InvalidQuestionCount {
                count: self.question_count,
            });
        }
        if !(1..=MAX_FIRST_QUESTION).contains(&self.first_question) {
            return Err(SettingsError::InvalidFirstQuestion {
                first: self.first_question,
            });
        }
        if self.time_limit_minutes > MAX_TIME_LIMIT_MINUTES {
            return Err(SettingsError::InvalidTimeLimit {
                minutes: self.time_limit_minutes,
            });
        }

        let options = match self.options {
            Some(labels) => AnswerOptions::new(labels)?,
            None => AnswerOptions::first_n(self.option_count)?,
        };

        Ok(TestSettings {
            time_limit: TimeLimit::from_minutes(self.time_limit_minutes),
            range: QuestionRange::new(
                QuestionNumber::new(self.first_question),
                self.question_count,
            ),
            options,
            display: self.display,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draft_validates() {
        let settings = TestSettingsDraft::new().validate().unwrap();
        assert!(settings.time_limit().is_untimed());
        assert_eq!(settings.question_count(), 10);
        assert_eq!(settings.first_question(), QuestionNumber::new(1));
        assert_eq!(settings.options().to_string(), "A, B, C, D, E");
        assert!(settings.display().show_doubt_buttons);
        assert!(!settings.display().auto_advance);
    }

    #[test]
    fn rejects_out_of_range_counts() {
        let draft = TestSettingsDraft {
            question_count: 0,
            ..TestSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidQuestionCount { count: 0 }
        );

        let draft = TestSettingsDraft {
            option_count: 11,
            ..TestSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidOptionCount { count: 11 }
        );

        let draft = TestSettingsDraft {
            first_question: 0,
            ..TestSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidFirstQuestion { first: 0 }
        );
    }

    #[test]
    fn custom_options_must_be_distinct() {
        let err = AnswerOptions::new(["A", "B", "A"]).unwrap_err();
        assert_eq!(err, SettingsError::DuplicateOption("A".into()));

        let err = AnswerOptions::new(["A", "  "]).unwrap_err();
        assert_eq!(err, SettingsError::EmptyOption);

        let ok = AnswerOptions::new([" P ", "Q"]).unwrap();
        assert_eq!(ok.labels(), ["P".to_string(), "Q".to_string()]);
    }

    #[test]
    fn time_limit_conversions() {
        assert_eq!(TimeLimit::from_minutes(0), TimeLimit::Untimed);
        assert_eq!(TimeLimit::from_minutes(90).as_secs(), 5_400);
        assert_eq!(TimeLimit::from_secs(600), Some(TimeLimit::Minutes(10)));
        assert_eq!(TimeLimit::from_secs(0), Some(TimeLimit::Untimed));
        assert_eq!(TimeLimit::Untimed.as_secs(), 0);
    }

    #[test]
    fn partial_minutes_do_not_convert() {
        assert_eq!(TimeLimit::from_secs(90), None);
        assert_eq!(TimeLimit::from_secs(59), None);
        assert_eq!(TimeLimit::from_secs(1_000 * 60), None);
        let limit = TimeLimit::from_secs(5_400).unwrap();
        assert_eq!(limit.as_secs(), 5_400);
    }
}
