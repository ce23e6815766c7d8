//! Structure-level diff: column/row metadata registries compared key by key.
//!
//! Metadata content is compared with position normalized out, so a column
//! that merely moved is reported as moved, not modified. A column can be
//! both moved and modified; it then appears in both lists.

use tabgit_hash::deep_equal;
use tabgit_store::{ColumnMeta, RowMeta, TableStructure};

/// A position change for one column or row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaMove {
    pub id: String,
    pub from: u32,
    pub to: u32,
}

/// Column metadata changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnChanges {
    pub added: Vec<ColumnMeta>,
    pub deleted: Vec<ColumnMeta>,
    /// `(old, new)` pairs whose content differs.
    pub modified: Vec<(ColumnMeta, ColumnMeta)>,
    pub moved: Vec<MetaMove>,
}

impl ColumnChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.moved.is_empty()
    }
}

/// Row metadata changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowChanges {
    pub added: Vec<RowMeta>,
    pub deleted: Vec<RowMeta>,
    /// `(old, new)` pairs whose content differs.
    pub modified: Vec<(RowMeta, RowMeta)>,
    pub moved: Vec<MetaMove>,
}

impl RowChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.moved.is_empty()
    }
}

/// The result of comparing two table structures.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructureDiff {
    pub columns: ColumnChanges,
    pub rows: RowChanges,
    /// The relative order of surviving columns changed.
    pub columns_reordered: bool,
    /// The relative order of surviving rows changed.
    pub rows_reordered: bool,
}

impl StructureDiff {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
            && self.rows.is_empty()
            && !self.columns_reordered
            && !self.rows_reordered
    }
}

fn column_content(meta: &ColumnMeta) -> ColumnMeta {
    ColumnMeta {
        order: 0,
        ..meta.clone()
    }
}

fn row_content(meta: &RowMeta) -> RowMeta {
    RowMeta {
        order: 0,
        ..meta.clone()
    }
}

/// Whether the relative order of ids common to both arrays changed.
fn common_order_changed(old: &[String], new: &[String]) -> bool {
    let old_common: Vec<&String> = old.iter().filter(|id| new.contains(id)).collect();
    let new_common: Vec<&String> = new.iter().filter(|id| old.contains(id)).collect();
    old_common != new_common
}

/// Compare two table structures.
pub fn diff_structures(old: &TableStructure, new: &TableStructure) -> StructureDiff {
    let mut diff = StructureDiff::default();

    // Columns: deletions and content/position changes.
    for meta in old.columns() {
        match new.column(&meta.id) {
            Some(new_meta) => {
                if !deep_equal(&column_content(meta), &column_content(new_meta)) {
                    diff.columns.modified.push((meta.clone(), new_meta.clone()));
                }
                if meta.order != new_meta.order {
                    diff.columns.moved.push(MetaMove {
                        id: meta.id.clone(),
                        from: meta.order,
                        to: new_meta.order,
                    });
                }
            }
            None => diff.columns.deleted.push(meta.clone()),
        }
    }
    // Columns: additions.
    for meta in new.columns() {
        if old.column(&meta.id).is_none() {
            diff.columns.added.push(meta.clone());
        }
    }

    // Rows: same shape.
    for meta in old.rows() {
        match new.row(&meta.id) {
            Some(new_meta) => {
                if !deep_equal(&row_content(meta), &row_content(new_meta)) {
                    diff.rows.modified.push((meta.clone(), new_meta.clone()));
                }
                if meta.order != new_meta.order {
                    diff.rows.moved.push(MetaMove {
                        id: meta.id.clone(),
                        from: meta.order,
                        to: new_meta.order,
                    });
                }
            }
            None => diff.rows.deleted.push(meta.clone()),
        }
    }
    for meta in new.rows() {
        if old.row(&meta.id).is_none() {
            diff.rows.added.push(meta.clone());
        }
    }

    diff.columns_reordered = common_order_changed(old.column_order(), new.column_order());
    diff.rows_reordered = common_order_changed(old.row_order(), new.row_order());

    diff
}
