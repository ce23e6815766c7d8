//! Conflict data produced by the three-way merge.
//!
//! Conflicts are ordinary return data, not errors: the merge reports them
//! and the caller resolves them explicitly through the
//! [`ConflictResolver`](crate::ConflictResolver).

use serde::{Deserialize, Serialize};
use tabgit_store::{CellObject, ColumnMeta, RowMeta};
use tabgit_types::Position;

/// Which side of the merge an action belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeSide {
    /// The checked-out side (ours).
    Current,
    /// The incoming branch (theirs).
    Target,
}

/// Both sides changed one cell away from the base in different ways.
///
/// `base` is `None` when the base commit had no cell at this position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellConflict {
    pub sheet: String,
    pub position: Position,
    pub base: Option<CellObject>,
    pub current: Option<CellObject>,
    pub target: Option<CellObject>,
}

/// The three sides of a structure conflict, per column or row id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StructureSides {
    Column {
        base: Option<ColumnMeta>,
        current: Option<ColumnMeta>,
        target: Option<ColumnMeta>,
    },
    Row {
        base: Option<RowMeta>,
        current: Option<RowMeta>,
        target: Option<RowMeta>,
    },
}

/// Both sides changed one column or row away from the base differently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureConflict {
    pub sheet: String,
    pub id: String,
    pub sides: StructureSides,
}

/// A whole-sheet conflict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SheetConflictKind {
    /// Both sides added a different sheet under the same name.
    AddedDifferently,
    /// One side deleted the sheet while the other modified it.
    DeletedWhileModified { deleted_by: MergeSide },
}

/// A conflict at the sheet-list level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetConflict {
    pub name: String,
    pub kind: SheetConflictKind,
}

/// Any conflict a merge can produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Conflict {
    Cell(CellConflict),
    Structure(StructureConflict),
    Sheet(SheetConflict),
}

impl Conflict {
    /// The sheet this conflict belongs to.
    pub fn sheet(&self) -> &str {
        match self {
            Conflict::Cell(c) => &c.sheet,
            Conflict::Structure(s) => &s.sheet,
            Conflict::Sheet(s) => &s.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabgit_types::CellValue;

    #[test]
    fn conflict_sheet_accessor() {
        let cell = Conflict::Cell(CellConflict {
            sheet: "default".into(),
            position: Position::new(0, 0),
            base: None,
            current: Some(CellObject::new(0, 0, CellValue::Number(1.0), None, None)),
            target: Some(CellObject::new(0, 0, CellValue::Number(2.0), None, None)),
        });
        assert_eq!(cell.sheet(), "default");

        let sheet = Conflict::Sheet(SheetConflict {
            name: "budget".into(),
            kind: SheetConflictKind::AddedDifferently,
        });
        assert_eq!(sheet.sheet(), "budget");
    }

    #[test]
    fn serde_roundtrip() {
        let conflict = Conflict::Structure(StructureConflict {
            sheet: "default".into(),
            id: "col_1".into(),
            sides: StructureSides::Column {
                base: Some(ColumnMeta::new("col_1", "Price", 0)),
                current: None,
                target: Some(ColumnMeta::new("col_1", "Cost", 0)),
            },
        });
        let json = serde_json::to_string(&conflict).unwrap();
        let back: Conflict = serde_json::from_str(&json).unwrap();
        assert_eq!(conflict, back);
    }
}
