//! Cell-level diff between two sheet trees.
//!
//! Cells are compared by stored hash: a changed hash means changed content,
//! so no cell needs loading to *detect* a change. Changed cells are then
//! loaded so the result carries the actual values for reporting.

use std::collections::BTreeSet;

use tabgit_store::{io, ObjectStore, SheetTree};
use tabgit_types::Position;

use crate::error::DiffResult;
use crate::structure_diff::{diff_structures, StructureDiff};

/// One cell-level change.
#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
    pub position: Position,
    /// The cell on the old side, absent for additions.
    pub old: Option<tabgit_store::CellObject>,
    /// The cell on the new side, absent for deletions.
    pub new: Option<tabgit_store::CellObject>,
}

/// Cell changes grouped by kind, each keyed by position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellChanges {
    pub added: Vec<CellChange>,
    pub modified: Vec<CellChange>,
    pub deleted: Vec<CellChange>,
}

impl CellChanges {
    /// Returns `true` if no cell changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Total number of changed cells.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }
}

/// The result of comparing two sheets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetDiff {
    pub cells: CellChanges,
    pub structure: StructureDiff,
}

impl SheetDiff {
    /// Returns `true` if neither cells nor structure changed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.structure.is_empty()
    }
}

/// Compare two sheets, loading changed cells from the store.
pub fn diff_sheets(
    store: &dyn ObjectStore,
    old: &SheetTree,
    new: &SheetTree,
) -> DiffResult<SheetDiff> {
    let mut cells = CellChanges::default();

    let positions: BTreeSet<Position> = old
        .cells()
        .map(|(p, _)| p)
        .chain(new.cells().map(|(p, _)| p))
        .collect();

    for position in positions {
        match (old.cell(position), new.cell(position)) {
            (Some(a), Some(b)) if a == b => {}
            (Some(a), Some(b)) => cells.modified.push(CellChange {
                position,
                old: Some(io::read_cell(store, &a)?),
                new: Some(io::read_cell(store, &b)?),
            }),
            (None, Some(b)) => cells.added.push(CellChange {
                position,
                old: None,
                new: Some(io::read_cell(store, &b)?),
            }),
            (Some(a), None) => cells.deleted.push(CellChange {
                position,
                old: Some(io::read_cell(store, &a)?),
                new: None,
            }),
            (None, None) => {}
        }
    }

    Ok(SheetDiff {
        cells,
        structure: diff_structures(old.structure(), new.structure()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabgit_store::{io, CellObject, InMemoryObjectStore};
    use tabgit_types::{CellValue, ObjectId};

    fn put_cell(
        store: &InMemoryObjectStore,
        sheet: &mut SheetTree,
        row: u32,
        col: u32,
        n: f64,
    ) -> ObjectId {
        let cell = CellObject::new(row, col, CellValue::Number(n), None, None);
        let id = io::write_cell(store, &cell).unwrap();
        sheet.set_cell(Position::new(row, col), id);
        id
    }

    #[test]
    fn identical_sheets_no_changes() {
        let store = InMemoryObjectStore::new();
        let mut sheet = SheetTree::new();
        put_cell(&store, &mut sheet, 0, 0, 1.0);

        let diff = diff_sheets(&store, &sheet, &sheet.clone()).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn add_modify_delete_all_detected() {
        let store = InMemoryObjectStore::new();

        let mut old = SheetTree::new();
        put_cell(&store, &mut old, 0, 0, 1.0); // kept
        put_cell(&store, &mut old, 1, 0, 2.0); // modified
        put_cell(&store, &mut old, 2, 0, 3.0); // deleted

        let mut new = old.clone();
        put_cell(&store, &mut new, 1, 0, 20.0);
        new.remove_cell(Position::new(2, 0));
        put_cell(&store, &mut new, 3, 0, 4.0); // added

        let diff = diff_sheets(&store, &old, &new).unwrap();
        assert_eq!(diff.cells.added.len(), 1);
        assert_eq!(diff.cells.modified.len(), 1);
        assert_eq!(diff.cells.deleted.len(), 1);
        assert_eq!(diff.cells.len(), 3);
    }

    #[test]
    fn changes_carry_cell_values() {
        let store = InMemoryObjectStore::new();
        let mut old = SheetTree::new();
        put_cell(&store, &mut old, 0, 0, 5.0);
        let mut new = old.clone();
        put_cell(&store, &mut new, 0, 0, 7.0);

        let diff = diff_sheets(&store, &old, &new).unwrap();
        let change = &diff.cells.modified[0];
        assert_eq!(change.position, Position::new(0, 0));
        assert_eq!(
            change.old.as_ref().unwrap().value,
            CellValue::Number(5.0)
        );
        assert_eq!(
            change.new.as_ref().unwrap().value,
            CellValue::Number(7.0)
        );
    }

    #[test]
    fn empty_to_populated_all_additions() {
        let store = InMemoryObjectStore::new();
        let old = SheetTree::new();
        let mut new = SheetTree::new();
        put_cell(&store, &mut new, 0, 0, 1.0);
        put_cell(&store, &mut new, 0, 1, 2.0);

        let diff = diff_sheets(&store, &old, &new).unwrap();
        assert_eq!(diff.cells.added.len(), 2);
        assert!(diff.cells.modified.is_empty());
        assert!(diff.cells.deleted.is_empty());
    }

    #[test]
    fn structure_changes_surface_in_sheet_diff() {
        let store = InMemoryObjectStore::new();
        let old = SheetTree::new();
        let mut new = SheetTree::new();
        new.structure_mut()
            .add_column(tabgit_store::ColumnMeta::new("c1", "Price", 0))
            .unwrap();

        let diff = diff_sheets(&store, &old, &new).unwrap();
        assert!(diff.cells.is_empty());
        assert_eq!(diff.structure.columns.added.len(), 1);
        assert!(!diff.is_empty());
    }
}
