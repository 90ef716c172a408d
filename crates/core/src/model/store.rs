use indexmap::IndexMap;
use thiserror::Error;

use crate::model::record::TestRecord;
use crate::model::reorder::{DragGesture, DropTarget};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("a test named {0:?} already exists")]
    NameTaken(String),

    #[error("test name cannot be empty")]
    EmptyName,

    #[error("no test named {0:?}")]
    NotFound(String),

    #[error("position {index} is outside the list of {len} tests")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Trim a user-entered name; whitespace-only names become `None`.
#[must_use]
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Saved tests by name, in the user's chosen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestStore {
    entries: IndexMap<String, TestRecord>,
}

impl TestStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TestRecord> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TestRecord> {
        self.entries.get_mut(name)
    }

    /// Look up a record for modification, failing with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when no test has that name.
    pub fn require_mut(&mut self, name: &str) -> Result<&mut TestRecord, StoreError> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First free name among `base`, `base (1)`, `base (1) (2)`, ...
    ///
    /// Each attempt appends to the previous candidate rather than replacing the suffix.
    #[must_use]
    pub fn unique_default_name(&self, base: &str) -> String {
        let mut candidate = base.to_owned();
        let mut n = 0_u32;
        while self.contains(&candidate) {
            n += 1;
            candidate = format!("{candidate} ({n})");
        }
        candidate
    }

    /// Append a new record at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmptyName` or `StoreError::NameTaken`.
    pub fn insert_new(&mut self, name: &str, record: TestRecord) -> Result<String, StoreError> {
        let name = normalize_name(name).ok_or(StoreError::EmptyName)?;
        if self.contains(&name) {
            return Err(StoreError::NameTaken(name));
        }
        self.entries.insert(name.clone(), record);
        Ok(name)
    }

    /// Rename a test in place; its list position is unchanged.
    ///
    /// Returns the stored new name. Renaming to the current name does nothing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if `old` is unknown, `new` is blank, or `new` is taken.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, StoreError> {
        let new = normalize_name(new).ok_or(StoreError::EmptyName)?;
        let index = self
            .position(old)
            .ok_or_else(|| StoreError::NotFound(old.to_owned()))?;
        if new == old {
            return Ok(new);
        }
        if self.contains(&new) {
            return Err(StoreError::NameTaken(new));
        }

        let Some(record) = self.entries.shift_remove(old) else {
            return Err(StoreError::NotFound(old.to_owned()));
        };
        let (appended, _) = self.entries.insert_full(new.clone(), record);
        self.entries.move_index(appended, index);
        Ok(new)
    }

    /// Remove a test, keeping the relative order of the rest.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when no test has that name.
    pub fn remove(&mut self, name: &str) -> Result<TestRecord, StoreError> {
        self.entries
            .shift_remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }

    /// Move the entry at `from` so it ends up at `to`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IndexOutOfBounds` if either index is past the end.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        let len = self.len();
        for index in [from, to] {
            if index >= len {
                return Err(StoreError::IndexOutOfBounds { index, len });
            }
        }
        self.entries.move_index(from, to);
        Ok(())
    }

    /// Apply a drag gesture to the list and return the entry's new index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IndexOutOfBounds` if the gesture starts past the end.
    pub fn apply_drop(&mut self, gesture: &DragGesture) -> Result<usize, StoreError> {
        let len = self.len();
        if gesture.prev_index >= len {
            return Err(StoreError::IndexOutOfBounds {
                index: gesture.prev_index,
                len,
            });
        }
        let target: DropTarget = gesture.drop_target(len);
        let to = target.resolve(len);
        self.entries.move_index(gesture.prev_index, to);
        Ok(to)
    }
}

impl FromIterator<(String, TestRecord)> for TestStore {
    fn from_iter<I: IntoIterator<Item = (String, TestRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TestStore {
    type Item = (String, TestRecord);
    type IntoIter = indexmap::map::IntoIter<String, TestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::tests::record;

    fn store(names: &[&str]) -> TestStore {
        names
            .iter()
            .map(|n| ((*n).to_string(), record(1, &["A"], &["A"], &[1])))
            .collect()
    }

    fn names(store: &TestStore) -> Vec<&str> {
        store.names().collect()
    }

    #[test]
    fn rename_keeps_position() {
        let mut s = store(&["a", "b", "c"]);
        assert_eq!(s.rename("b", "  z ").unwrap(), "z");
        assert_eq!(names(&s), vec!["a", "z", "c"]);

        assert_eq!(s.rename("z", "a"), Err(StoreError::NameTaken("a".into())));
        assert_eq!(s.rename("z", "z").unwrap(), "z");
        assert_eq!(s.rename("q", "r"), Err(StoreError::NotFound("q".into())));
        assert_eq!(s.rename("a", "   "), Err(StoreError::EmptyName));
        assert_eq!(names(&s), vec!["a", "z", "c"]);
    }

    #[test]
    fn default_names_append_cumulatively() {
        let mut s = store(&["14/11/2023, 22:13:20"]);
        let base = "14/11/2023, 22:13:20";
        let first = s.unique_default_name(base);
        assert_eq!(first, "14/11/2023, 22:13:20 (1)");
        s.insert_new(&first, record(1, &["A"], &["A"], &[1])).unwrap();
        assert_eq!(s.unique_default_name(base), "14/11/2023, 22:13:20 (1) (2)");
    }

    #[test]
    fn insert_rejects_taken_and_blank_names() {
        let mut s = store(&["a"]);
        let rec = record(1, &["A"], &["A"], &[1]);
        assert_eq!(
            s.insert_new(" a ", rec.clone()),
            Err(StoreError::NameTaken("a".into()))
        );
        assert_eq!(s.insert_new("", rec), Err(StoreError::EmptyName));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn remove_and_move_keep_relative_order() {
        let mut s = store(&["a", "b", "c", "d"]);
        s.remove("b").unwrap();
        assert_eq!(names(&s), vec!["a", "c", "d"]);
        assert!(s.remove("b").is_err());

        s.move_entry(0, 2).unwrap();
        assert_eq!(names(&s), vec!["c", "d", "a"]);
        assert_eq!(
            s.move_entry(0, 3),
            Err(StoreError::IndexOutOfBounds { index: 3, len: 3 })
        );
    }

    #[test]
    fn drop_past_end_appends() {
        let mut s = store(&["a", "b", "c", "d"]);
        let gesture = DragGesture {
            item_height: 40.0,
            pointer_y: 1_000.0,
            margin_px: 0.0,
            prev_index: 0,
        };
        assert_eq!(s.apply_drop(&gesture).unwrap(), 3);
        assert_eq!(names(&s), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn dragging_last_onto_first_slot() {
        let mut s = store(&["t1", "t2", "t3"]);
        let gesture = DragGesture {
            item_height: 30.0,
            pointer_y: 5.0,
            margin_px: 0.0,
            prev_index: 2,
        };
        assert_eq!(s.apply_drop(&gesture).unwrap(), 0);
        assert_eq!(names(&s), vec!["t3", "t1", "t2"]);
    }

    #[test]
    fn drop_above_list_moves_to_front() {
        let mut s = store(&["a", "b", "c"]);
        let gesture = DragGesture {
            item_height: 40.0,
            pointer_y: -10.0,
            margin_px: 0.0,
            prev_index: 2,
        };
        assert_eq!(s.apply_drop(&gesture).unwrap(), 0);
        assert_eq!(names(&s), vec!["c", "a", "b"]);
    }
}
