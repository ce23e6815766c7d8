//! Stateless resolution strategies over merge conflicts.
//!
//! The resolver never talks to the repository: it maps a conflict plus a
//! strategy to a resolved object (or `None` to defer). The automatic
//! `Merge` heuristics — numeric averaging, `" | "` string concatenation,
//! changed-from-base field merging — are the system's documented defaults.

use serde::{Deserialize, Serialize};
use tabgit_hash::deep_equal;
use tabgit_store::{CellObject, ColumnMeta, RowMeta};
use tabgit_types::{CellFormat, CellValue};

use crate::conflict::{CellConflict, Conflict, StructureConflict, StructureSides};

/// An explicit caller-supplied resolution for a cell conflict.
///
/// Provided fields override whatever the conflict sides hold; absent fields
/// fall back to the current side (then target, then base).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResolution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<CellFormat>,
}

/// How to resolve a conflict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    /// Keep the local side.
    Current,
    /// Accept the incoming side.
    Target,
    /// Defer to the caller: resolution returns `None`.
    Manual,
    /// Attempt an automatic content merge.
    Merge,
    /// Explicit field overrides.
    Custom(CustomResolution),
}

/// A resolved structure conflict: the surviving metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResolvedMeta {
    Column(ColumnMeta),
    Row(RowMeta),
}

/// Stateless strategy application over merge conflicts.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolve a cell conflict.
    ///
    /// Returns `None` for the `Manual` strategy, or when the chosen side
    /// deleted the cell (the resolution *is* the deletion).
    pub fn resolve_cell(conflict: &CellConflict, strategy: &Strategy) -> Option<CellObject> {
        match strategy {
            Strategy::Current => conflict.current.clone(),
            Strategy::Target => conflict.target.clone(),
            Strategy::Manual => None,
            Strategy::Merge => merge_cells(conflict),
            Strategy::Custom(resolution) => custom_cell(conflict, resolution),
        }
    }

    /// Resolve a structure conflict.
    pub fn resolve_structure(
        conflict: &StructureConflict,
        strategy: &Strategy,
    ) -> Option<ResolvedMeta> {
        match &conflict.sides {
            StructureSides::Column {
                base,
                current,
                target,
            } => match strategy {
                Strategy::Current => current.clone().map(ResolvedMeta::Column),
                Strategy::Target => target.clone().map(ResolvedMeta::Column),
                Strategy::Manual | Strategy::Custom(_) => None,
                Strategy::Merge => {
                    merge_columns(base.as_ref(), current.as_ref(), target.as_ref())
                        .map(ResolvedMeta::Column)
                }
            },
            StructureSides::Row {
                base,
                current,
                target,
            } => match strategy {
                Strategy::Current => current.clone().map(ResolvedMeta::Row),
                Strategy::Target => target.clone().map(ResolvedMeta::Row),
                Strategy::Manual | Strategy::Custom(_) => None,
                Strategy::Merge => {
                    merge_rows(base.as_ref(), current.as_ref(), target.as_ref())
                        .map(ResolvedMeta::Row)
                }
            },
        }
    }

    /// Whether a conflict can be resolved without a human decision.
    ///
    /// True only for cell conflicts where one side is absent or both sides
    /// hold identical content. Structure and sheet conflicts are always
    /// manual.
    pub fn can_auto_resolve(conflict: &Conflict) -> bool {
        match conflict {
            Conflict::Cell(c) => match (&c.current, &c.target) {
                (None, _) | (_, None) => true,
                (Some(a), Some(b)) => deep_equal(a, b),
            },
            Conflict::Structure(_) | Conflict::Sheet(_) => false,
        }
    }

    /// Render a human-readable summary of a conflict list. No side effects.
    pub fn conflict_report(conflicts: &[Conflict]) -> String {
        let mut out = format!("Merge conflicts: {}\n", conflicts.len());

        let cells: Vec<&CellConflict> = conflicts
            .iter()
            .filter_map(|c| match c {
                Conflict::Cell(cell) => Some(cell),
                _ => None,
            })
            .collect();
        if !cells.is_empty() {
            out.push_str("\nCell conflicts:\n");
            for c in cells {
                out.push_str(&format!(
                    "  sheet '{}' at ({},{}): base={}, current={}, target={}\n",
                    c.sheet,
                    c.position.row,
                    c.position.col,
                    describe_cell(&c.base),
                    describe_cell(&c.current),
                    describe_cell(&c.target),
                ));
            }
        }

        let structures: Vec<&StructureConflict> = conflicts
            .iter()
            .filter_map(|c| match c {
                Conflict::Structure(s) => Some(s),
                _ => None,
            })
            .collect();
        if !structures.is_empty() {
            out.push_str("\nStructure conflicts:\n");
            for s in structures {
                let kind = match s.sides {
                    StructureSides::Column { .. } => "column",
                    StructureSides::Row { .. } => "row",
                };
                out.push_str(&format!("  sheet '{}' {kind} '{}'\n", s.sheet, s.id));
            }
        }

        let sheets: Vec<&crate::conflict::SheetConflict> = conflicts
            .iter()
            .filter_map(|c| match c {
                Conflict::Sheet(s) => Some(s),
                _ => None,
            })
            .collect();
        if !sheets.is_empty() {
            out.push_str("\nSheet conflicts:\n");
            for s in sheets {
                out.push_str(&format!("  sheet '{}': {:?}\n", s.name, s.kind));
            }
        }

        out
    }
}

fn describe_cell(cell: &Option<CellObject>) -> String {
    match cell {
        Some(c) => c.value.to_string(),
        None => "(none)".to_string(),
    }
}

/// The automatic cell merge heuristic: numeric values average, differing
/// strings concatenate with `" | "`, otherwise current's value wins with
/// target as fallback.
fn merge_cells(conflict: &CellConflict) -> Option<CellObject> {
    let (current, target) = match (&conflict.current, &conflict.target) {
        (None, None) => return None,
        (Some(c), None) => return Some(c.clone()),
        (None, Some(t)) => return Some(t.clone()),
        (Some(c), Some(t)) => (c, t),
    };

    let value = match (&current.value, &target.value) {
        (CellValue::Number(a), CellValue::Number(b)) => CellValue::Number((a + b) / 2.0),
        (CellValue::Text(a), CellValue::Text(b)) if a != b => {
            CellValue::Text(format!("{a} | {b}"))
        }
        (CellValue::Null, other) => other.clone(),
        (mine, _) => mine.clone(),
    };

    let formula = current
        .formula
        .clone()
        .filter(|f| !f.is_empty())
        .or_else(|| target.formula.clone());

    let format = match (&current.format, &target.format) {
        (Some(cf), Some(tf)) => Some(cf.overlay(tf)),
        (Some(cf), None) => Some(cf.clone()),
        (None, Some(tf)) => Some(tf.clone()),
        (None, None) => None,
    };

    Some(CellObject {
        row: conflict.position.row,
        column: conflict.position.col,
        value,
        formula,
        format,
    })
}

fn custom_cell(conflict: &CellConflict, resolution: &CustomResolution) -> Option<CellObject> {
    let fallback = conflict
        .current
        .as_ref()
        .or(conflict.target.as_ref())
        .or(conflict.base.as_ref());

    Some(CellObject {
        row: conflict.position.row,
        column: conflict.position.col,
        value: resolution
            .value
            .clone()
            .or_else(|| fallback.map(|c| c.value.clone()))
            .unwrap_or(CellValue::Null),
        formula: resolution
            .formula
            .clone()
            .or_else(|| fallback.and_then(|c| c.formula.clone())),
        format: resolution
            .format
            .clone()
            .or_else(|| fallback.and_then(|c| c.format.clone())),
    })
}

/// Field-level three-way choice: whoever changed from base wins, current
/// tie-breaks.
fn three_way<T: Clone + PartialEq>(base: Option<&T>, current: &T, target: &T) -> T {
    match base {
        Some(b) if current == b && target != b => target.clone(),
        _ => current.clone(),
    }
}

fn merge_columns(
    base: Option<&ColumnMeta>,
    current: Option<&ColumnMeta>,
    target: Option<&ColumnMeta>,
) -> Option<ColumnMeta> {
    let (current, target) = match (current, target) {
        (None, None) => return None,
        (Some(c), None) => return Some(c.clone()),
        (None, Some(t)) => return Some(t.clone()),
        (Some(c), Some(t)) => (c, t),
    };

    let constraints = match (&current.constraints, &target.constraints) {
        (Some(cc), Some(tc)) => Some(cc.merge_over(tc)),
        (a, b) => a.clone().or_else(|| b.clone()),
    };

    Some(ColumnMeta {
        id: current.id.clone(),
        name: three_way(base.map(|b| &b.name), &current.name, &target.name),
        description: three_way(
            base.map(|b| &b.description),
            &current.description,
            &target.description,
        ),
        order: current.order,
        width: three_way(base.map(|b| &b.width), &current.width, &target.width),
        hidden: three_way(base.map(|b| &b.hidden), &current.hidden, &target.hidden),
        data_type: three_way(
            base.map(|b| &b.data_type),
            &current.data_type,
            &target.data_type,
        ),
        constraints,
    })
}

fn merge_rows(
    base: Option<&RowMeta>,
    current: Option<&RowMeta>,
    target: Option<&RowMeta>,
) -> Option<RowMeta> {
    let (current, target) = match (current, target) {
        (None, None) => return None,
        (Some(c), None) => return Some(c.clone()),
        (None, Some(t)) => return Some(t.clone()),
        (Some(c), Some(t)) => (c, t),
    };

    Some(RowMeta {
        id: current.id.clone(),
        order: current.order,
        height: three_way(base.map(|b| &b.height), &current.height, &target.height),
        hidden: three_way(base.map(|b| &b.hidden), &current.hidden, &target.hidden),
    })
}
