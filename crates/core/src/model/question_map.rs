use std::collections::BTreeMap;

use crate::model::ids::{QuestionNumber, QuestionRange};

/// Per-question values keyed by question number, iterated in ascending order.
///
/// Answers, answer keys and per-question times all use this shape, so renumbering
/// a test is a single operation over every map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionMap<T> {
    entries: BTreeMap<QuestionNumber, T>,
}

impl<T> Default for QuestionMap<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> QuestionMap<T> {
    /// Map holding `value` for every question of `range`.
    #[must_use]
    pub fn filled(range: QuestionRange, value: T) -> Self
    where
        T: Clone,
    {
        Self {
            entries: range.iter().map(|q| (q, value.clone())).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, question: QuestionNumber) -> Option<&T> {
        self.entries.get(&question)
    }

    #[must_use]
    pub fn get_mut(&mut self, question: QuestionNumber) -> Option<&mut T> {
        self.entries.get_mut(&question)
    }

    /// Replace the value of an existing question. Unknown keys are left out.
    pub fn replace(&mut self, question: QuestionNumber, value: T) -> Option<T> {
        self.entries
            .get_mut(&question)
            .map(|slot| std::mem::replace(slot, value))
    }

    #[must_use]
    pub fn contains(&self, question: QuestionNumber) -> bool {
        self.entries.contains_key(&question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionNumber, &T)> {
        self.entries.iter().map(|(q, v)| (*q, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = QuestionNumber> + '_ {
        self.entries.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// True when the keys are exactly the questions of `range`.
    #[must_use]
    pub fn covers(&self, range: QuestionRange) -> bool {
        self.entries.len() == range.len() as usize && range.iter().all(|q| self.contains(q))
    }

    /// Rekey every entry by `delta`.
    ///
    /// All old→new pairs are collected before the new map is built, so overlapping
    /// old and new ranges never overwrite entries that have not moved yet. Returns
    /// `None` (and drops nothing from `self`) if any key would leave the valid range.
    #[must_use]
    pub fn shifted(&self, delta: i64) -> Option<Self>
    where
        T: Clone,
    {
        let pairs = self
            .entries
            .iter()
            .map(|(q, v)| q.checked_offset(delta).map(|moved| (moved, v.clone())))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            entries: pairs.into_iter().collect(),
        })
    }
}

impl<T> FromIterator<(QuestionNumber, T)> for QuestionMap<T> {
    fn from_iter<I: IntoIterator<Item = (QuestionNumber, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for QuestionMap<T> {
    type Item = (QuestionNumber, T);
    type IntoIter = std::collections::btree_map::IntoIter<QuestionNumber, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: u32) -> QuestionNumber {
        QuestionNumber::new(n)
    }

    #[test]
    fn filled_covers_range() {
        let range = QuestionRange::new(q(5), 3);
        let map = QuestionMap::filled(range, 0_u32);
        assert!(map.covers(range));
        assert!(!map.covers(QuestionRange::new(q(5), 4)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec![q(5), q(6), q(7)]);
    }

    #[test]
    fn replace_ignores_unknown_keys() {
        let mut map = QuestionMap::filled(QuestionRange::new(q(1), 2), "");
        assert_eq!(map.replace(q(2), "B"), Some(""));
        assert_eq!(map.replace(q(9), "C"), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(q(2)), Some(&"B"));
    }

    #[test]
    fn shift_with_overlapping_ranges_keeps_every_value() {
        let map: QuestionMap<u32> = (1..=4).map(|n| (q(n), n * 10)).collect();
        let moved = map.shifted(2).unwrap();
        assert_eq!(
            moved.iter().map(|(k, v)| (k.value(), *v)).collect::<Vec<_>>(),
            vec![(3, 10), (4, 20), (5, 30), (6, 40)]
        );
        assert_eq!(moved.shifted(-2).unwrap(), map);
    }

    #[test]
    fn shift_below_one_is_refused() {
        let map: QuestionMap<u32> = (1..=2).map(|n| (q(n), n)).collect();
        assert!(map.shifted(-1).is_none());
    }
}
