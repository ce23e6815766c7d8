//! The materialized working tree: one mutable sheet per name.
//!
//! A [`Worktree`] is the scratch copy of the checked-out commit's table.
//! Commit folding clones it, applies every staged change in index order,
//! and writes the result back as new objects — the stored originals are
//! never touched.

use std::collections::BTreeMap;

use tabgit_index::{Change, ChangeKind};
use tabgit_store::{io, CellObject, ObjectStore, SheetTree, TableTree};
use tabgit_types::{ObjectId, Position};

use crate::error::{RepoError, RepoResult};

/// The in-memory materialization of one commit's sheets.
#[derive(Clone, Debug, Default)]
pub struct Worktree {
    sheets: BTreeMap<String, SheetTree>,
    order: Vec<String>,
}

impl Worktree {
    /// Create an empty working tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a working tree from a stored table tree.
    pub fn load(store: &dyn ObjectStore, table: &TableTree) -> RepoResult<Self> {
        let mut worktree = Self::new();
        for name in table.sheet_names() {
            let id = table
                .sheet(name)
                .ok_or_else(|| RepoError::SheetNotFound(name.clone()))?;
            let sheet = io::read_sheet(store, &id)?;
            worktree.insert_sheet(name.clone(), sheet)?;
        }
        Ok(worktree)
    }

    /// Write every sheet (and its structure) to the store and return the
    /// table tree referencing them.
    pub fn write_objects(&self, store: &dyn ObjectStore) -> RepoResult<TableTree> {
        let mut table = TableTree::new();
        for name in &self.order {
            let sheet = &self.sheets[name];
            let id = io::write_sheet(store, sheet)?;
            table.add_sheet(name.clone(), id)?;
        }
        Ok(table)
    }

    /// The sheet with the given name, if present.
    pub fn sheet(&self, name: &str) -> Option<&SheetTree> {
        self.sheets.get(name)
    }

    /// Mutable access to a sheet.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetTree> {
        self.sheets.get_mut(name)
    }

    /// Sheet names in display order.
    pub fn sheet_names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Add a sheet at the end of the order.
    pub fn insert_sheet(&mut self, name: impl Into<String>, sheet: SheetTree) -> RepoResult<()> {
        let name = name.into();
        if self.sheets.contains_key(&name) {
            return Err(RepoError::SheetExists(name));
        }
        self.order.push(name.clone());
        self.sheets.insert(name, sheet);
        Ok(())
    }

    /// Remove a sheet.
    pub fn remove_sheet(&mut self, name: &str) -> RepoResult<SheetTree> {
        let sheet = self
            .sheets
            .remove(name)
            .ok_or_else(|| RepoError::SheetNotFound(name.to_string()))?;
        self.order.retain(|n| n != name);
        Ok(sheet)
    }

    /// Rename a sheet, keeping its position and contents.
    pub fn rename_sheet(&mut self, from: &str, to: impl Into<String>) -> RepoResult<()> {
        let to = to.into();
        if self.sheets.contains_key(&to) {
            return Err(RepoError::SheetExists(to));
        }
        let sheet = self
            .sheets
            .remove(from)
            .ok_or_else(|| RepoError::SheetNotFound(from.to_string()))?;
        for name in &mut self.order {
            if name == from {
                *name = to.clone();
            }
        }
        self.sheets.insert(to, sheet);
        Ok(())
    }

    /// Fold one staged change onto this working tree.
    ///
    /// Cell payloads are materialized as cell objects and written to the
    /// store here (write-then-link: content objects land before anything
    /// references them; a failed fold leaves at most unreferenced objects
    /// in the append-only store, never partial repository state).
    pub fn apply(&mut self, change: &Change, store: &dyn ObjectStore) -> RepoResult<()> {
        match &change.kind {
            ChangeKind::SheetAdd => {
                return self.insert_sheet(change.sheet.clone(), SheetTree::new());
            }
            ChangeKind::SheetDelete => {
                return self.remove_sheet(&change.sheet).map(|_| ());
            }
            ChangeKind::SheetRename { to } => {
                return self.rename_sheet(&change.sheet, to.clone());
            }
            _ => {}
        }

        let sheet = self
            .sheets
            .get_mut(&change.sheet)
            .ok_or_else(|| RepoError::SheetNotFound(change.sheet.clone()))?;

        match &change.kind {
            ChangeKind::CellAdd {
                position,
                value,
                formula,
                format,
            }
            | ChangeKind::CellUpdate {
                position,
                value,
                formula,
                format,
            } => {
                let cell = CellObject::new(
                    position.row,
                    position.col,
                    value.clone(),
                    formula.clone(),
                    format.clone(),
                );
                let id = io::write_cell(store, &cell)?;
                sheet.set_cell(*position, id);
            }
            ChangeKind::CellDelete { position } => {
                sheet.remove_cell(*position);
            }
            ChangeKind::ColumnAdd { meta } => {
                sheet.insert_column_before(meta.order, meta.clone())?;
            }
            ChangeKind::ColumnUpdate { meta } => {
                sheet.structure_mut().update_column(meta.clone())?;
            }
            ChangeKind::ColumnDelete { id } => {
                sheet.delete_column(id)?;
            }
            ChangeKind::ColumnMove { id, to } => {
                sheet.structure_mut().move_column(id, *to)?;
            }
            ChangeKind::RowAdd { meta } => {
                sheet.insert_row_before(meta.order, meta.clone())?;
            }
            ChangeKind::RowDelete { id } => {
                sheet.delete_row(id)?;
            }
            ChangeKind::SortRows { column, ascending } => {
                sheet.sort_rows(*column, *ascending, |id: &ObjectId| {
                    io::read_cell(store, id).ok().map(|c| c.value)
                });
            }
            ChangeKind::SheetAdd | ChangeKind::SheetDelete | ChangeKind::SheetRename { .. } => {
                unreachable!("sheet ops handled above")
            }
        }

        Ok(())
    }

    /// The cell value at a position, reading through the store.
    pub fn cell_value(
        &self,
        store: &dyn ObjectStore,
        sheet: &str,
        position: Position,
    ) -> RepoResult<Option<tabgit_types::CellValue>> {
        let sheet = self
            .sheet(sheet)
            .ok_or_else(|| RepoError::SheetNotFound(sheet.to_string()))?;
        match sheet.cell(position) {
            Some(id) => Ok(Some(io::read_cell(store, &id)?.value)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabgit_index::Change;
    use tabgit_store::{ColumnMeta, InMemoryObjectStore, RowMeta};
    use tabgit_types::CellValue;

    fn cell_add(sheet: &str, row: u32, col: u32, n: f64) -> Change {
        Change::new(
            sheet,
            ChangeKind::CellAdd {
                position: Position::new(row, col),
                value: CellValue::Number(n),
                formula: None,
                format: None,
            },
        )
    }

    fn seeded() -> (InMemoryObjectStore, Worktree) {
        let store = InMemoryObjectStore::new();
        let mut wt = Worktree::new();
        wt.insert_sheet("default", SheetTree::new()).unwrap();
        (store, wt)
    }

    #[test]
    fn apply_cell_add_materializes_object() {
        let (store, mut wt) = seeded();
        wt.apply(&cell_add("default", 0, 0, 42.0), &store).unwrap();

        let value = wt
            .cell_value(&store, "default", Position::new(0, 0))
            .unwrap();
        assert_eq!(value, Some(CellValue::Number(42.0)));
        // The cell object is already in the store.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn apply_cell_delete() {
        let (store, mut wt) = seeded();
        wt.apply(&cell_add("default", 0, 0, 1.0), &store).unwrap();
        wt.apply(
            &Change::new(
                "default",
                ChangeKind::CellDelete {
                    position: Position::new(0, 0),
                },
            ),
            &store,
        )
        .unwrap();
        assert!(wt
            .cell_value(&store, "default", Position::new(0, 0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn apply_to_missing_sheet_errors() {
        let (store, mut wt) = seeded();
        let err = wt.apply(&cell_add("ghost", 0, 0, 1.0), &store).unwrap_err();
        assert!(matches!(err, RepoError::SheetNotFound(_)));
    }

    #[test]
    fn apply_sheet_lifecycle() {
        let (store, mut wt) = seeded();
        wt.apply(&Change::new("budget", ChangeKind::SheetAdd), &store)
            .unwrap();
        assert_eq!(wt.sheet_names(), &["default", "budget"]);

        wt.apply(
            &Change::new("budget", ChangeKind::SheetRename { to: "plan".into() }),
            &store,
        )
        .unwrap();
        assert_eq!(wt.sheet_names(), &["default", "plan"]);

        wt.apply(&Change::new("plan", ChangeKind::SheetDelete), &store)
            .unwrap();
        assert_eq!(wt.sheet_names(), &["default"]);
    }

    #[test]
    fn duplicate_sheet_add_errors() {
        let (store, mut wt) = seeded();
        let err = wt
            .apply(&Change::new("default", ChangeKind::SheetAdd), &store)
            .unwrap_err();
        assert!(matches!(err, RepoError::SheetExists(_)));
    }

    #[test]
    fn apply_column_and_row_changes() {
        let (store, mut wt) = seeded();
        wt.apply(
            &Change::new(
                "default",
                ChangeKind::ColumnAdd {
                    meta: ColumnMeta::new("price", "Price", 0),
                },
            ),
            &store,
        )
        .unwrap();
        wt.apply(
            &Change::new(
                "default",
                ChangeKind::RowAdd {
                    meta: RowMeta::new("r1", 0),
                },
            ),
            &store,
        )
        .unwrap();

        let structure = wt.sheet("default").unwrap().structure();
        assert_eq!(structure.column_count(), 1);
        assert_eq!(structure.row_count(), 1);

        wt.apply(
            &Change::new(
                "default",
                ChangeKind::ColumnDelete {
                    id: "price".into(),
                },
            ),
            &store,
        )
        .unwrap();
        assert_eq!(wt.sheet("default").unwrap().structure().column_count(), 0);
    }

    #[test]
    fn apply_sort_rows_reads_cells_through_store() {
        let (store, mut wt) = seeded();
        wt.apply(&cell_add("default", 0, 0, 30.0), &store).unwrap();
        wt.apply(&cell_add("default", 1, 0, 10.0), &store).unwrap();
        wt.apply(&cell_add("default", 2, 0, 20.0), &store).unwrap();
        wt.apply(
            &Change::new(
                "default",
                ChangeKind::SortRows {
                    column: 0,
                    ascending: true,
                },
            ),
            &store,
        )
        .unwrap();

        let v = |r: u32| {
            wt.cell_value(&store, "default", Position::new(r, 0))
                .unwrap()
                .unwrap()
        };
        assert_eq!(v(0), CellValue::Number(10.0));
        assert_eq!(v(1), CellValue::Number(20.0));
        assert_eq!(v(2), CellValue::Number(30.0));
    }

    #[test]
    fn write_objects_and_load_roundtrip() {
        let (store, mut wt) = seeded();
        wt.apply(&cell_add("default", 2, 3, 7.0), &store).unwrap();
        wt.apply(&Change::new("extra", ChangeKind::SheetAdd), &store)
            .unwrap();

        let table = wt.write_objects(&store).unwrap();
        let reloaded = Worktree::load(&store, &table).unwrap();

        assert_eq!(reloaded.sheet_names(), wt.sheet_names());
        assert_eq!(
            reloaded
                .cell_value(&store, "default", Position::new(2, 3))
                .unwrap(),
            Some(CellValue::Number(7.0))
        );
    }
}
