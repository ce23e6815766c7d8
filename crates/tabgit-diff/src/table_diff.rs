//! Top-level diff between two commits.
//!
//! Compares the ordered sheet-name lists of two table trees, detecting
//! added, deleted, renamed (same tree hash under a new name), and moved
//! sheets, then produces a [`SheetDiff`] for every sheet whose content
//! differs — including asymmetrically present sheets, which are diffed
//! against an empty sheet.

use std::collections::{BTreeMap, HashSet};

use tabgit_store::{io, ObjectStore, SheetTree, TableTree};
use tabgit_types::ObjectId;

use crate::error::DiffResult;
use crate::sheet_diff::{diff_sheets, SheetDiff};

/// A position change for one sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetMove {
    pub name: String,
    pub from: usize,
    pub to: usize,
}

/// The result of comparing two commits' table trees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableDiff {
    /// Sheets present only on the new side.
    pub added: Vec<String>,
    /// Sheets present only on the old side.
    pub deleted: Vec<String>,
    /// `(old_name, new_name)` pairs pointing at the same sheet tree.
    pub renamed: Vec<(String, String)>,
    /// Sheets whose display position changed.
    pub moved: Vec<SheetMove>,
    /// Per-sheet content diffs, keyed by the new-side name (old-side name
    /// for deleted sheets).
    pub sheets: BTreeMap<String, SheetDiff>,
}

impl TableDiff {
    /// Returns `true` if the two commits have identical table content.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
            && self.moved.is_empty()
            && self.sheets.values().all(|d| d.is_empty())
    }
}

/// Diff the table trees of two commits.
pub fn diff_commits(
    store: &dyn ObjectStore,
    a: &ObjectId,
    b: &ObjectId,
) -> DiffResult<TableDiff> {
    let commit_a = io::read_commit(store, a)?;
    let commit_b = io::read_commit(store, b)?;
    let table_a = io::read_table(store, &commit_a.tree)?;
    let table_b = io::read_table(store, &commit_b.tree)?;
    diff_tables(store, &table_a, &table_b)
}

/// Diff two table trees directly.
pub fn diff_tables(
    store: &dyn ObjectStore,
    old: &TableTree,
    new: &TableTree,
) -> DiffResult<TableDiff> {
    let mut diff = TableDiff::default();

    let only_old: Vec<&String> = old
        .sheet_names()
        .iter()
        .filter(|n| new.sheet(n).is_none())
        .collect();
    let only_new: Vec<&String> = new
        .sheet_names()
        .iter()
        .filter(|n| old.sheet(n).is_none())
        .collect();

    // Rename detection: a removed and an added name pointing at the same
    // sheet tree is a rename, not a delete + add.
    let mut renamed_old: HashSet<&String> = HashSet::new();
    let mut renamed_new: HashSet<&String> = HashSet::new();
    for old_name in &only_old {
        for new_name in &only_new {
            if renamed_old.contains(*old_name) || renamed_new.contains(*new_name) {
                continue;
            }
            if old.sheet(old_name) == new.sheet(new_name) {
                diff.renamed
                    .push(((*old_name).clone(), (*new_name).clone()));
                renamed_old.insert(*old_name);
                renamed_new.insert(*new_name);
            }
        }
    }

    // Deleted sheets: diff against an empty sheet so the result carries the
    // dropped cells.
    for name in &only_old {
        if renamed_old.contains(*name) {
            continue;
        }
        diff.deleted.push((*name).clone());
        if let Some(id) = old.sheet(name) {
            let sheet = io::read_sheet(store, &id)?;
            diff.sheets.insert(
                (*name).clone(),
                diff_sheets(store, &sheet, &SheetTree::new())?,
            );
        }
    }

    // Added sheets: diff from an empty sheet.
    for name in &only_new {
        if renamed_new.contains(*name) {
            continue;
        }
        diff.added.push((*name).clone());
        if let Some(id) = new.sheet(name) {
            let sheet = io::read_sheet(store, &id)?;
            diff.sheets.insert(
                (*name).clone(),
                diff_sheets(store, &SheetTree::new(), &sheet)?,
            );
        }
    }

    // Common sheets: moves and content diffs.
    for name in old.sheet_names() {
        let Some(new_id) = new.sheet(name) else {
            continue;
        };
        let old_id = old.sheet(name).unwrap_or_else(ObjectId::null);

        if let (Some(from), Some(to)) = (old.index_of(name), new.index_of(name)) {
            if from != to {
                diff.moved.push(SheetMove {
                    name: name.clone(),
                    from,
                    to,
                });
            }
        }

        if old_id != new_id {
            let old_sheet = io::read_sheet(store, &old_id)?;
            let new_sheet = io::read_sheet(store, &new_id)?;
            diff.sheets
                .insert(name.clone(), diff_sheets(store, &old_sheet, &new_sheet)?);
        }
    }

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabgit_store::{CellObject, InMemoryObjectStore};
    use tabgit_types::{CellValue, Position};

    fn sheet_with_cell(store: &InMemoryObjectStore, row: u32, col: u32, n: f64) -> ObjectId {
        let mut sheet = SheetTree::new();
        let cell = CellObject::new(row, col, CellValue::Number(n), None, None);
        let id = io::write_cell(store, &cell).unwrap();
        sheet.set_cell(Position::new(row, col), id);
        io::write_sheet(store, &sheet).unwrap()
    }

    #[test]
    fn identical_tables_empty_diff() {
        let store = InMemoryObjectStore::new();
        let sheet_id = sheet_with_cell(&store, 0, 0, 1.0);
        let mut table = TableTree::new();
        table.add_sheet("default", sheet_id).unwrap();

        let diff = diff_tables(&store, &table, &table.clone()).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn added_and_deleted_sheets() {
        let store = InMemoryObjectStore::new();
        let a = sheet_with_cell(&store, 0, 0, 1.0);
        let b = sheet_with_cell(&store, 0, 0, 2.0);

        let mut old = TableTree::new();
        old.add_sheet("gone", a).unwrap();
        let mut new = TableTree::new();
        new.add_sheet("fresh", b).unwrap();

        let diff = diff_tables(&store, &old, &new).unwrap();
        assert_eq!(diff.deleted, vec!["gone"]);
        assert_eq!(diff.added, vec!["fresh"]);
        // Asymmetric sheets still carry their cell-level content.
        assert_eq!(diff.sheets["gone"].cells.deleted.len(), 1);
        assert_eq!(diff.sheets["fresh"].cells.added.len(), 1);
    }

    #[test]
    fn rename_detected_by_shared_tree() {
        let store = InMemoryObjectStore::new();
        let sheet_id = sheet_with_cell(&store, 0, 0, 1.0);

        let mut old = TableTree::new();
        old.add_sheet("before", sheet_id).unwrap();
        let mut new = TableTree::new();
        new.add_sheet("after", sheet_id).unwrap();

        let diff = diff_tables(&store, &old, &new).unwrap();
        assert_eq!(diff.renamed, vec![("before".to_string(), "after".to_string())]);
        assert!(diff.added.is_empty());
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn moved_sheet_detected() {
        let store = InMemoryObjectStore::new();
        let a = sheet_with_cell(&store, 0, 0, 1.0);
        let b = sheet_with_cell(&store, 0, 0, 2.0);

        let mut old = TableTree::new();
        old.add_sheet("first", a).unwrap();
        old.add_sheet("second", b).unwrap();

        let mut new = old.clone();
        new.move_sheet("second", 0).unwrap();

        let diff = diff_tables(&store, &old, &new).unwrap();
        assert_eq!(diff.moved.len(), 2);
        assert!(diff
            .moved
            .iter()
            .any(|m| m.name == "second" && m.from == 1 && m.to == 0));
    }

    #[test]
    fn modified_sheet_gets_cell_diff() {
        let store = InMemoryObjectStore::new();
        let a = sheet_with_cell(&store, 0, 0, 1.0);
        let b = sheet_with_cell(&store, 0, 0, 9.0);

        let mut old = TableTree::new();
        old.add_sheet("default", a).unwrap();
        let mut new = TableTree::new();
        new.add_sheet("default", b).unwrap();

        let diff = diff_tables(&store, &old, &new).unwrap();
        assert_eq!(diff.sheets["default"].cells.modified.len(), 1);
    }

    #[test]
    fn diff_commits_reads_full_graph() {
        use chrono::{TimeZone, Utc};
        use tabgit_store::CommitObject;
        use tabgit_types::Author;

        let store = InMemoryObjectStore::new();
        let sheet_a = sheet_with_cell(&store, 0, 0, 1.0);
        let sheet_b = sheet_with_cell(&store, 0, 0, 2.0);

        let mut table_a = TableTree::new();
        table_a.add_sheet("default", sheet_a).unwrap();
        let mut table_b = TableTree::new();
        table_b.add_sheet("default", sheet_b).unwrap();

        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let author = Author::new("Ada", "ada@example.com");
        let ca = io::write_commit(
            &store,
            &CommitObject::new(io::write_table(&store, &table_a).unwrap(), None, author.clone(), "a", ts),
        )
        .unwrap();
        let cb = io::write_commit(
            &store,
            &CommitObject::new(io::write_table(&store, &table_b).unwrap(), Some(ca), author, "b", ts),
        )
        .unwrap();

        let diff = diff_commits(&store, &ca, &cb).unwrap();
        assert_eq!(diff.sheets["default"].cells.modified.len(), 1);
    }
}
