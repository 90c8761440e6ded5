use std::collections::BTreeSet;

use serde::Serialize;

/// Units currently selected on a single checkout form.
///
/// Identifiers are unique by construction. Each form submission carries its
/// own selection, so two open forms never observe each other's state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    units: BTreeSet<String>,
}

impl SelectionSet {
    /// Empty selection, as seen when the form is first shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `id` when present and adds it otherwise.
    ///
    /// Returns `true` when `id` is selected after the call.
    pub fn toggle(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.units.remove(&id) {
            false
        } else {
            self.units.insert(id);
            true
        }
    }

    /// Adds `id` without toggling; returns `false` if it was already selected.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.units.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains(id)
    }

    /// Number of selected units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(String::as_str)
    }

    /// Drops every selected unit (form reset or completed submission).
    pub fn clear(&mut self) {
        self.units.clear();
    }
}

impl FromIterator<String> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_then_removes() {
        let mut selection = SelectionSet::new();

        assert!(selection.toggle("film-craft"));
        assert!(selection.contains("film-craft"));
        assert_eq!(selection.len(), 1);

        assert!(!selection.toggle("film-craft"));
        assert!(selection.is_empty());
    }

    #[test]
    fn collecting_collapses_duplicates() {
        let selection: SelectionSet = ["a", "b", "a"].into_iter().collect();

        assert_eq!(selection.len(), 2);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn clear_resets_selection() {
        let mut selection: SelectionSet = ["a", "b"].into_iter().collect();
        selection.clear();

        assert!(selection.is_empty());
        assert!(selection.insert("a"));
        assert!(!selection.insert("a"));
        assert_eq!(selection.len(), 1);
    }
}
