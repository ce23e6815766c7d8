//! The three-way merge over sheets, cells, and structure.
//!
//! The rule at every granularity is the same: if both sides agree, or only
//! one side moved away from the base, the merge is silent; only when both
//! sides moved away from the base to *different* states is a conflict
//! recorded. No merge commit is ever created — the caller finalizes a clean
//! merge however it chooses.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tabgit_hash::deep_equal;
use tabgit_store::{io, ObjectStore, TableTree};
use tabgit_types::{ObjectId, Position};
use tracing::debug;

use crate::base::find_merge_base;
use crate::conflict::{
    CellConflict, Conflict, MergeSide, SheetConflict, SheetConflictKind, StructureConflict,
    StructureSides,
};
use crate::error::MergeResult;

/// The result of a three-way merge.
///
/// `success` is `false` either when no common ancestor exists (`base` is
/// `None`, `conflicts` empty) or when conflicts were found.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub success: bool,
    /// The common ancestor used, absent when histories are unrelated.
    pub base: Option<ObjectId>,
    pub conflicts: Vec<Conflict>,
}

impl MergeOutcome {
    fn clean(base: ObjectId) -> Self {
        Self {
            success: true,
            base: Some(base),
            conflicts: Vec::new(),
        }
    }

    fn no_common_ancestor() -> Self {
        Self {
            success: false,
            base: None,
            conflicts: Vec::new(),
        }
    }

    /// Returns `true` when histories were unrelated.
    pub fn has_no_base(&self) -> bool {
        self.base.is_none()
    }
}

/// Three-way merge of `target` into `current`.
///
/// Reads the two commits and their common ancestor from the store and
/// reports per-sheet, per-cell, and per-column/row conflicts. Pure: the
/// store is only read.
pub fn merge_commits(
    store: &dyn ObjectStore,
    current: &ObjectId,
    target: &ObjectId,
) -> MergeResult<MergeOutcome> {
    let Some(base_id) = find_merge_base(store, current, target)? else {
        debug!(current = %current.short_hex(), target = %target.short_hex(), "no common ancestor");
        return Ok(MergeOutcome::no_common_ancestor());
    };

    // Fast paths: one side already contains the other.
    if base_id == *target || base_id == *current || current == target {
        return Ok(MergeOutcome::clean(base_id));
    }

    let base_table = read_table_of(store, &base_id)?;
    let current_table = read_table_of(store, current)?;
    let target_table = read_table_of(store, target)?;

    let mut conflicts = Vec::new();

    // Sheet names in current's order, then target-only names.
    let mut names: Vec<String> = current_table.sheet_names().to_vec();
    for name in target_table.sheet_names() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    // Base-only names (deleted on both sides) still need the agreement check.
    for name in base_table.sheet_names() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    for name in &names {
        let b = base_table.sheet(name);
        let c = current_table.sheet(name);
        let t = target_table.sheet(name);

        if c == t || b == c || b == t {
            // Agreement, or only one side moved: the other side's state wins
            // silently. Deletions fold the same way.
            continue;
        }

        match (b, c, t) {
            (None, Some(_), Some(_)) => {
                conflicts.push(Conflict::Sheet(SheetConflict {
                    name: name.clone(),
                    kind: SheetConflictKind::AddedDifferently,
                }));
            }
            (Some(_), None, Some(_)) => {
                conflicts.push(Conflict::Sheet(SheetConflict {
                    name: name.clone(),
                    kind: SheetConflictKind::DeletedWhileModified {
                        deleted_by: MergeSide::Current,
                    },
                }));
            }
            (Some(_), Some(_), None) => {
                conflicts.push(Conflict::Sheet(SheetConflict {
                    name: name.clone(),
                    kind: SheetConflictKind::DeletedWhileModified {
                        deleted_by: MergeSide::Target,
                    },
                }));
            }
            (Some(base_sheet), Some(cur_sheet), Some(tgt_sheet)) => {
                merge_sheet(
                    store,
                    name,
                    &base_sheet,
                    &cur_sheet,
                    &tgt_sheet,
                    &mut conflicts,
                )?;
            }
            // Remaining shapes are covered by the agreement checks above.
            _ => {}
        }
    }

    debug!(
        base = %base_id.short_hex(),
        conflicts = conflicts.len(),
        "three-way merge computed"
    );

    Ok(MergeOutcome {
        success: conflicts.is_empty(),
        base: Some(base_id),
        conflicts,
    })
}

fn read_table_of(store: &dyn ObjectStore, commit: &ObjectId) -> MergeResult<TableTree> {
    let commit = io::read_commit(store, commit)?;
    Ok(io::read_table(store, &commit.tree)?)
}

/// Cell- and structure-level three-way merge within one sheet.
fn merge_sheet(
    store: &dyn ObjectStore,
    sheet_name: &str,
    base_id: &ObjectId,
    current_id: &ObjectId,
    target_id: &ObjectId,
    conflicts: &mut Vec<Conflict>,
) -> MergeResult<()> {
    let base = io::read_sheet(store, base_id)?;
    let current = io::read_sheet(store, current_id)?;
    let target = io::read_sheet(store, target_id)?;

    // Cells: every position touched on either side.
    let positions: BTreeSet<Position> = base
        .cells()
        .map(|(p, _)| p)
        .chain(current.cells().map(|(p, _)| p))
        .chain(target.cells().map(|(p, _)| p))
        .collect();

    for position in positions {
        let b = base.cell(position);
        let c = current.cell(position);
        let t = target.cell(position);

        if c == t || b == c || b == t {
            continue;
        }

        let load = |id: Option<ObjectId>| -> MergeResult<Option<tabgit_store::CellObject>> {
            id.map(|id| io::read_cell(store, &id)).transpose().map_err(Into::into)
        };

        conflicts.push(Conflict::Cell(CellConflict {
            sheet: sheet_name.to_string(),
            position,
            base: load(b)?,
            current: load(c)?,
            target: load(t)?,
        }));
    }

    // Structure: per column id, then per row id.
    let column_ids: BTreeSet<&String> = base
        .structure()
        .column_order()
        .iter()
        .chain(current.structure().column_order())
        .chain(target.structure().column_order())
        .collect();

    for id in column_ids {
        let b = base.structure().column(id);
        let c = current.structure().column(id);
        let t = target.structure().column(id);

        if sides_agree(&b, &c, &t) {
            continue;
        }

        conflicts.push(Conflict::Structure(StructureConflict {
            sheet: sheet_name.to_string(),
            id: id.clone(),
            sides: StructureSides::Column {
                base: b.cloned(),
                current: c.cloned(),
                target: t.cloned(),
            },
        }));
    }

    let row_ids: BTreeSet<&String> = base
        .structure()
        .row_order()
        .iter()
        .chain(current.structure().row_order())
        .chain(target.structure().row_order())
        .collect();

    for id in row_ids {
        let b = base.structure().row(id);
        let c = current.structure().row(id);
        let t = target.structure().row(id);

        if sides_agree(&b, &c, &t) {
            continue;
        }

        conflicts.push(Conflict::Structure(StructureConflict {
            sheet: sheet_name.to_string(),
            id: id.clone(),
            sides: StructureSides::Row {
                base: b.cloned(),
                current: c.cloned(),
                target: t.cloned(),
            },
        }));
    }

    Ok(())
}

/// The three-way agreement test for metadata: no conflict when both sides
/// are equal, or when either side still matches the base.
fn sides_agree<T: serde::Serialize>(base: &Option<&T>, current: &Option<&T>, target: &Option<&T>) -> bool {
    opt_equal(current, target) || opt_equal(base, current) || opt_equal(base, target)
}

fn opt_equal<T: serde::Serialize>(a: &Option<&T>, b: &Option<&T>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => deep_equal(x, y),
        _ => false,
    }
}
