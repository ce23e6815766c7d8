//! One sheet's versioned snapshot: sparse cell grid plus structure.
//!
//! [`SheetTree`] maps [`Position`] to cell hash and owns one
//! [`TableStructure`]. Its content hash covers the cell map and the
//! structure's *hash* (composition, not contents), so the structure is
//! stored as a separate object and the sheet references it — the same
//! shape as a git tree referencing blobs.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabgit_types::{CellValue, ObjectId, Position};

use crate::error::StoreResult;
use crate::object::{decode, encode, ObjectKind, StoredObject};
use crate::structure::{ColumnMeta, RowMeta, TableStructure};

/// The stored form of a sheet: cell map plus structure reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SheetRecord {
    pub cells: BTreeMap<Position, ObjectId>,
    pub structure: ObjectId,
}

/// A single sheet's sparse cell grid and structural metadata.
///
/// The engine clones a `SheetTree` whenever it needs a working copy to
/// mutate; stored sheets are never modified in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetTree {
    cells: BTreeMap<Position, ObjectId>,
    structure: TableStructure,
}

impl SheetTree {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reassemble a sheet from its stored parts.
    pub fn from_parts(cells: BTreeMap<Position, ObjectId>, structure: TableStructure) -> Self {
        Self { cells, structure }
    }

    // ---------------------------------------------------------------
    // Cell access
    // ---------------------------------------------------------------

    /// The cell hash at a position, if any.
    pub fn cell(&self, position: Position) -> Option<ObjectId> {
        self.cells.get(&position).copied()
    }

    /// Set the cell hash at a position, returning any previous hash.
    pub fn set_cell(&mut self, position: Position, id: ObjectId) -> Option<ObjectId> {
        self.cells.insert(position, id)
    }

    /// Remove the cell at a position, returning its hash if present.
    pub fn remove_cell(&mut self, position: Position) -> Option<ObjectId> {
        self.cells.remove(&position)
    }

    /// All occupied positions and their cell hashes, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Position, ObjectId)> + '_ {
        self.cells.iter().map(|(p, id)| (*p, *id))
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The structural metadata registry.
    pub fn structure(&self) -> &TableStructure {
        &self.structure
    }

    /// Mutable access to the structural metadata registry.
    pub fn structure_mut(&mut self) -> &mut TableStructure {
        &mut self.structure
    }

    /// The grid extent: one past the highest occupied row and column,
    /// also covering registered structure rows/columns.
    pub fn extent(&self) -> (u32, u32) {
        let mut rows = self.structure.row_count() as u32;
        let mut cols = self.structure.column_count() as u32;
        for pos in self.cells.keys() {
            rows = rows.max(pos.row + 1);
            cols = cols.max(pos.col + 1);
        }
        (rows, cols)
    }

    // ---------------------------------------------------------------
    // Coordinate-shifting edits
    // ---------------------------------------------------------------

    /// Insert a row before the given grid index: registers the metadata and
    /// shifts every cell at `row >= index` down by one.
    pub fn insert_row_before(&mut self, index: u32, mut meta: RowMeta) -> StoreResult<()> {
        meta.order = index;
        self.structure.add_row(meta)?;
        self.remap_cells(|pos| {
            if pos.row >= index {
                Some(Position::new(pos.row + 1, pos.col))
            } else {
                Some(pos)
            }
        });
        Ok(())
    }

    /// Insert a column before the given grid index: registers the metadata
    /// and shifts every cell at `col >= index` right by one.
    pub fn insert_column_before(&mut self, index: u32, mut meta: ColumnMeta) -> StoreResult<()> {
        meta.order = index;
        self.structure.add_column(meta)?;
        self.remap_cells(|pos| {
            if pos.col >= index {
                Some(Position::new(pos.row, pos.col + 1))
            } else {
                Some(pos)
            }
        });
        Ok(())
    }

    /// Delete the row with the given metadata id: drops its cells and
    /// shifts every cell below it up by one.
    pub fn delete_row(&mut self, id: &str) -> StoreResult<RowMeta> {
        let meta = self.structure.remove_row(id)?;
        let index = meta.order;
        self.remap_cells(|pos| match pos.row.cmp(&index) {
            Ordering::Less => Some(pos),
            Ordering::Equal => None,
            Ordering::Greater => Some(Position::new(pos.row - 1, pos.col)),
        });
        Ok(meta)
    }

    /// Delete the column with the given metadata id: drops its cells and
    /// shifts every cell to its right left by one.
    pub fn delete_column(&mut self, id: &str) -> StoreResult<ColumnMeta> {
        let meta = self.structure.remove_column(id)?;
        let index = meta.order;
        self.remap_cells(|pos| match pos.col.cmp(&index) {
            Ordering::Less => Some(pos),
            Ordering::Equal => None,
            Ordering::Greater => Some(Position::new(pos.row, pos.col - 1)),
        });
        Ok(meta)
    }

    /// Sort rows by the values in one column.
    ///
    /// `value_of` resolves a cell hash to its value (normally a store read).
    /// Rows with no value in the sort column keep their relative order and
    /// sort last in either direction. When the row metadata registry covers
    /// every grid row, it is permuted alongside the cells; otherwise the
    /// registry is left untouched.
    pub fn sort_rows<F>(&mut self, column: u32, ascending: bool, value_of: F)
    where
        F: Fn(&ObjectId) -> Option<CellValue>,
    {
        let (row_count, _) = self.extent();
        if row_count < 2 {
            return;
        }

        let keys: Vec<Option<CellValue>> = (0..row_count)
            .map(|r| {
                self.cells
                    .get(&Position::new(r, column))
                    .and_then(|id| value_of(id))
                    .filter(|v| !v.is_null())
            })
            .collect();

        // permutation[new_index] = old_index
        let mut permutation: Vec<usize> = (0..row_count as usize).collect();
        permutation.sort_by(|&a, &b| match (&keys[a], &keys[b]) {
            (Some(va), Some(vb)) => {
                let ord = cmp_cell_values(va, vb);
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        // inverse[old_index] = new_index
        let mut inverse = vec![0u32; permutation.len()];
        for (new_index, &old_index) in permutation.iter().enumerate() {
            inverse[old_index] = new_index as u32;
        }

        self.remap_cells(|pos| Some(Position::new(inverse[pos.row as usize], pos.col)));

        if self.structure.row_count() == row_count as usize {
            self.structure.permute_rows(&permutation);
        }
    }

    fn remap_cells<F>(&mut self, f: F)
    where
        F: Fn(Position) -> Option<Position>,
    {
        let old = std::mem::take(&mut self.cells);
        for (pos, id) in old {
            if let Some(new_pos) = f(pos) {
                self.cells.insert(new_pos, id);
            }
        }
    }

    // ---------------------------------------------------------------
    // Storage
    // ---------------------------------------------------------------

    /// Content-addressed ID covering the cell map and the structure's hash.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Convert into a `StoredObject` for storage.
    ///
    /// The structure is referenced by hash, so it must be written as its own
    /// object alongside (see [`crate::io::write_sheet`]).
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let record = SheetRecord {
            cells: self.cells.clone(),
            structure: self.structure.compute_id()?,
        };
        encode(ObjectKind::Sheet, &record)
    }

    /// Decode the stored record; the caller resolves the structure reference.
    pub(crate) fn record_from_stored_object(obj: &StoredObject) -> StoreResult<SheetRecord> {
        decode(ObjectKind::Sheet, obj)
    }
}

/// Total order over present cell values used by row sorting:
/// numbers, then text, then booleans, then dates.
fn cmp_cell_values(a: &CellValue, b: &CellValue) -> Ordering {
    fn rank(v: &CellValue) -> u8 {
        match v {
            CellValue::Number(_) => 0,
            CellValue::Text(_) => 1,
            CellValue::Bool(_) => 2,
            CellValue::Date(_) => 3,
            CellValue::Null => 4,
        }
    }
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (CellValue::Text(x), CellValue::Text(y)) => x.cmp(y),
        (CellValue::Bool(x), CellValue::Bool(y)) => x.cmp(y),
        (CellValue::Date(x), CellValue::Date(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 20])
    }

    #[test]
    fn set_and_get_cell() {
        let mut sheet = SheetTree::new();
        assert!(sheet.cell(Position::new(0, 0)).is_none());
        sheet.set_cell(Position::new(0, 0), oid(1));
        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(1)));
        assert_eq!(sheet.cell_count(), 1);
    }

    #[test]
    fn remove_cell() {
        let mut sheet = SheetTree::new();
        sheet.set_cell(Position::new(1, 1), oid(1));
        assert_eq!(sheet.remove_cell(Position::new(1, 1)), Some(oid(1)));
        assert!(sheet.remove_cell(Position::new(1, 1)).is_none());
    }

    #[test]
    fn insert_row_shifts_cells_down() {
        let mut sheet = SheetTree::new();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(1, 0), oid(2));
        sheet.set_cell(Position::new(2, 5), oid(3));

        sheet.insert_row_before(1, RowMeta::new("r", 1)).unwrap();

        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(1)));
        assert!(sheet.cell(Position::new(1, 0)).is_none());
        assert_eq!(sheet.cell(Position::new(2, 0)), Some(oid(2)));
        assert_eq!(sheet.cell(Position::new(3, 5)), Some(oid(3)));
    }

    #[test]
    fn insert_column_shifts_cells_right() {
        let mut sheet = SheetTree::new();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(0, 1), oid(2));

        sheet
            .insert_column_before(1, ColumnMeta::new("c", "C", 1))
            .unwrap();

        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(1)));
        assert_eq!(sheet.cell(Position::new(0, 2)), Some(oid(2)));
    }

    #[test]
    fn delete_row_drops_and_shifts() {
        let mut sheet = SheetTree::new();
        sheet.structure_mut().add_row(RowMeta::new("r0", 0)).unwrap();
        sheet.structure_mut().add_row(RowMeta::new("r1", 1)).unwrap();
        sheet.structure_mut().add_row(RowMeta::new("r2", 2)).unwrap();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(1, 0), oid(2));
        sheet.set_cell(Position::new(2, 0), oid(3));

        let removed = sheet.delete_row("r1").unwrap();
        assert_eq!(removed.id, "r1");

        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(1)));
        assert_eq!(sheet.cell(Position::new(1, 0)), Some(oid(3)));
        assert_eq!(sheet.cell_count(), 2);
        assert_eq!(sheet.structure().row_order(), &["r0", "r2"]);
    }

    #[test]
    fn delete_column_drops_and_shifts() {
        let mut sheet = SheetTree::new();
        sheet
            .structure_mut()
            .add_column(ColumnMeta::new("a", "A", 0))
            .unwrap();
        sheet
            .structure_mut()
            .add_column(ColumnMeta::new("b", "B", 1))
            .unwrap();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(0, 1), oid(2));

        sheet.delete_column("a").unwrap();
        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(2)));
        assert_eq!(sheet.cell_count(), 1);
    }

    #[test]
    fn delete_unknown_row_errors() {
        let mut sheet = SheetTree::new();
        assert!(sheet.delete_row("ghost").is_err());
    }

    #[test]
    fn sort_rows_by_numeric_column() {
        let mut sheet = SheetTree::new();
        let values: HashMap<ObjectId, CellValue> = [
            (oid(1), CellValue::Number(30.0)),
            (oid(2), CellValue::Number(10.0)),
            (oid(3), CellValue::Number(20.0)),
        ]
        .into_iter()
        .collect();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(1, 0), oid(2));
        sheet.set_cell(Position::new(2, 0), oid(3));
        // A second column rides along with its row.
        sheet.set_cell(Position::new(0, 1), oid(9));

        sheet.sort_rows(0, true, |id| values.get(id).cloned());

        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(2)));
        assert_eq!(sheet.cell(Position::new(1, 0)), Some(oid(3)));
        assert_eq!(sheet.cell(Position::new(2, 0)), Some(oid(1)));
        // 30.0's row moved to index 2, carrying its neighbor cell.
        assert_eq!(sheet.cell(Position::new(2, 1)), Some(oid(9)));
    }

    #[test]
    fn sort_rows_descending_keeps_missing_last() {
        let mut sheet = SheetTree::new();
        let values: HashMap<ObjectId, CellValue> = [
            (oid(1), CellValue::Number(1.0)),
            (oid(2), CellValue::Number(2.0)),
        ]
        .into_iter()
        .collect();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(1, 0), oid(2));
        sheet.set_cell(Position::new(2, 1), oid(3)); // row 2 has nothing in col 0

        sheet.sort_rows(0, false, |id| values.get(id).cloned());

        assert_eq!(sheet.cell(Position::new(0, 0)), Some(oid(2)));
        assert_eq!(sheet.cell(Position::new(1, 0)), Some(oid(1)));
        assert_eq!(sheet.cell(Position::new(2, 1)), Some(oid(3)));
    }

    #[test]
    fn sort_rows_permutes_row_metadata_when_covering() {
        let mut sheet = SheetTree::new();
        let values: HashMap<ObjectId, CellValue> = [
            (oid(1), CellValue::Number(5.0)),
            (oid(2), CellValue::Number(1.0)),
        ]
        .into_iter()
        .collect();
        sheet.structure_mut().add_row(RowMeta::new("r0", 0)).unwrap();
        sheet.structure_mut().add_row(RowMeta::new("r1", 1)).unwrap();
        sheet.set_cell(Position::new(0, 0), oid(1));
        sheet.set_cell(Position::new(1, 0), oid(2));

        sheet.sort_rows(0, true, |id| values.get(id).cloned());

        assert_eq!(sheet.structure().row_order(), &["r1", "r0"]);
    }

    #[test]
    fn hash_composes_structure_hash() {
        let mut a = SheetTree::new();
        a.set_cell(Position::new(0, 0), oid(1));
        let mut b = a.clone();
        assert_eq!(a.compute_id().unwrap(), b.compute_id().unwrap());

        b.structure_mut()
            .add_column(ColumnMeta::new("c", "C", 0))
            .unwrap();
        assert_ne!(a.compute_id().unwrap(), b.compute_id().unwrap());
    }

    #[test]
    fn hash_covers_cell_map() {
        let mut a = SheetTree::new();
        a.set_cell(Position::new(0, 0), oid(1));
        let mut b = a.clone();
        b.set_cell(Position::new(0, 0), oid(2));
        assert_ne!(a.compute_id().unwrap(), b.compute_id().unwrap());
    }

    #[test]
    fn extent_spans_cells_and_structure() {
        let mut sheet = SheetTree::new();
        assert_eq!(sheet.extent(), (0, 0));
        sheet.set_cell(Position::new(4, 2), oid(1));
        assert_eq!(sheet.extent(), (5, 3));
        sheet
            .structure_mut()
            .add_column(ColumnMeta::new("a", "A", 0))
            .unwrap();
        assert_eq!(sheet.extent(), (5, 3));
    }

    #[test]
    fn clone_is_independent() {
        let mut original = SheetTree::new();
        original.set_cell(Position::new(0, 0), oid(1));
        let mut copy = original.clone();
        copy.set_cell(Position::new(0, 0), oid(2));
        assert_eq!(original.cell(Position::new(0, 0)), Some(oid(1)));
    }
}
