use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Printed label of a question ("soal nomor 7").
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionNumber(u32);

impl QuestionNumber {
    /// Creates a new `QuestionNumber`
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Shift by `delta`, refusing results below 1 or past `u32::MAX`.
    #[must_use]
    pub fn checked_offset(self, delta: i64) -> Option<Self> {
        let shifted = i64::from(self.0).checked_add(delta)?;
        if shifted < 1 {
            return None;
        }
        u32::try_from(shifted).ok().map(Self)
    }
}

impl fmt::Debug for QuestionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionNumber({})", self.0)
    }
}

impl fmt::Display for QuestionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing a question number from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseQuestionNumberError {
    raw: String,
}

impl fmt::Display for ParseQuestionNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse question number from {:?}", self.raw)
    }
}

impl std::error::Error for ParseQuestionNumberError {}

impl FromStr for QuestionNumber {
    type Err = ParseQuestionNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(QuestionNumber::new)
            .map_err(|_| ParseQuestionNumberError { raw: s.to_string() })
    }
}

// ─── Question Range ────────────────────────────────────────────────────────────

/// Contiguous block of question numbers covered by one test.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct QuestionRange {
    first: QuestionNumber,
    count: u32,
}

impl QuestionRange {
    /// `count` of zero is widened to one; settings validation rejects it earlier.
    #[must_use]
    pub fn new(first: QuestionNumber, count: u32) -> Self {
        Self {
            first,
            count: count.max(1),
        }
    }

    #[must_use]
    pub fn first(&self) -> QuestionNumber {
        self.first
    }

    #[must_use]
    pub fn last(&self) -> QuestionNumber {
        QuestionNumber::new(self.first.value().saturating_add(self.count - 1))
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn contains(&self, number: QuestionNumber) -> bool {
        number >= self.first && number <= self.last()
    }

    /// Same block of questions starting at another number.
    #[must_use]
    pub fn with_first(&self, first: QuestionNumber) -> Self {
        Self::new(first, self.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = QuestionNumber> + use<> {
        (self.first.value()..=self.last().value()).map(QuestionNumber::new)
    }
}

impl fmt::Display for QuestionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{} - {}", self.first, self.last())
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_number_display_and_parse() {
        let q: QuestionNumber = " 42 ".parse().unwrap();
        assert_eq!(q, QuestionNumber::new(42));
        assert_eq!(q.to_string(), "42");
        assert!("x".parse::<QuestionNumber>().is_err());
    }

    #[test]
    fn checked_offset_refuses_zero() {
        let q = QuestionNumber::new(3);
        assert_eq!(q.checked_offset(2), Some(QuestionNumber::new(5)));
        assert_eq!(q.checked_offset(-2), Some(QuestionNumber::new(1)));
        assert_eq!(q.checked_offset(-3), None);
    }

    #[test]
    fn range_bounds_and_label() {
        let range = QuestionRange::new(QuestionNumber::new(11), 10);
        assert_eq!(range.last(), QuestionNumber::new(20));
        assert!(range.contains(QuestionNumber::new(11)));
        assert!(range.contains(QuestionNumber::new(20)));
        assert!(!range.contains(QuestionNumber::new(21)));
        assert_eq!(range.iter().count(), 10);
        assert_eq!(range.to_string(), "11 - 20");

        let single = QuestionRange::new(QuestionNumber::new(7), 1);
        assert_eq!(single.to_string(), "7");
    }
}
