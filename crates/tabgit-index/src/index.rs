//! The insertion-ordered staging map.

use std::collections::{BTreeSet, HashMap};

use crate::change::{Change, ChangeKey};

/// The staging area: not-yet-committed changes, keyed for coalescing.
///
/// Iteration yields changes in first-insertion order; overwriting a key
/// keeps its original position. Commit folding depends on this order, so it
/// is part of the contract, not an implementation detail.
#[derive(Clone, Debug, Default)]
pub struct StageIndex {
    order: Vec<ChangeKey>,
    changes: HashMap<ChangeKey, Change>,
}

impl StageIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a change, returning any change it replaced at the same key.
    pub fn stage(&mut self, change: Change) -> Option<Change> {
        let key = change.key();
        let replaced = self.changes.insert(key.clone(), change);
        if replaced.is_none() {
            self.order.push(key);
        }
        replaced
    }

    /// The staged change at a key, if any.
    pub fn get(&self, key: &ChangeKey) -> Option<&Change> {
        self.changes.get(key)
    }

    /// Remove the staged change at a key.
    pub fn remove(&mut self, key: &ChangeKey) -> Option<Change> {
        let removed = self.changes.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// Discard all staged changes.
    pub fn clear(&mut self) {
        self.order.clear();
        self.changes.clear();
    }

    /// Number of staged changes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Staged changes in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.order.iter().filter_map(|k| self.changes.get(k))
    }

    /// Names of all sheets touched by staged changes, sorted.
    pub fn sheets_touched(&self) -> BTreeSet<&str> {
        self.changes.values().map(|c| c.sheet.as_str()).collect()
    }
}
