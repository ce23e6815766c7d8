use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabgit_store::{ColumnMeta, RowMeta};
use tabgit_types::{CellFormat, CellValue, Position};

/// What a staged change does.
///
/// Cell payloads carry the full new content; the cell object itself is only
/// materialized at commit time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// A cell is written where the working tree had none.
    CellAdd {
        position: Position,
        value: CellValue,
        formula: Option<String>,
        format: Option<CellFormat>,
    },
    /// An existing cell's content is replaced.
    CellUpdate {
        position: Position,
        value: CellValue,
        formula: Option<String>,
        format: Option<CellFormat>,
    },
    /// A cell is removed.
    CellDelete { position: Position },

    ColumnAdd { meta: ColumnMeta },
    ColumnUpdate { meta: ColumnMeta },
    ColumnDelete { id: String },
    ColumnMove { id: String, to: u32 },

    RowAdd { meta: RowMeta },
    RowDelete { id: String },
    /// Reorder rows by the values in one column.
    SortRows { column: u32, ascending: bool },

    SheetAdd,
    SheetDelete,
    SheetRename { to: String },
}

impl ChangeKind {
    /// Returns `true` for cell add/delete kinds.
    ///
    /// The add-vs-update classification rule treats a staged add or delete
    /// at the same key as "the cell did not exist at commit-start".
    pub fn is_cell_add_or_delete(&self) -> bool {
        matches!(self, Self::CellAdd { .. } | Self::CellDelete { .. })
    }
}

/// One staged change record. Transient: lives only in the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// The sheet this change applies to.
    pub sheet: String,
    pub kind: ChangeKind,
    pub staged_at: DateTime<Utc>,
}

impl Change {
    pub fn new(sheet: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            sheet: sheet.into(),
            kind,
            staged_at: Utc::now(),
        }
    }

    /// The coalescing key for this change.
    pub fn key(&self) -> ChangeKey {
        let target = match &self.kind {
            ChangeKind::CellAdd { position, .. }
            | ChangeKind::CellUpdate { position, .. }
            | ChangeKind::CellDelete { position } => ChangeTarget::Cell(*position),
            ChangeKind::ColumnAdd { meta } => ChangeTarget::Column(meta.id.clone()),
            ChangeKind::ColumnUpdate { meta } => ChangeTarget::Column(meta.id.clone()),
            ChangeKind::ColumnDelete { id } | ChangeKind::ColumnMove { id, .. } => {
                ChangeTarget::Column(id.clone())
            }
            ChangeKind::RowAdd { meta } => ChangeTarget::Row(meta.id.clone()),
            ChangeKind::RowDelete { id } => ChangeTarget::Row(id.clone()),
            ChangeKind::SortRows { .. } => ChangeTarget::RowOrder,
            ChangeKind::SheetAdd | ChangeKind::SheetDelete | ChangeKind::SheetRename { .. } => {
                ChangeTarget::Sheet
            }
        };
        ChangeKey {
            sheet: self.sheet.clone(),
            target,
        }
    }
}

/// The part of a sheet a change targets. Changes with equal keys coalesce.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeTarget {
    Cell(Position),
    Column(String),
    Row(String),
    /// Row ordering as a whole (sorting).
    RowOrder,
    /// The sheet itself (add/delete/rename).
    Sheet,
}

/// Coalescing key: sheet name plus change target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeKey {
    pub sheet: String,
    pub target: ChangeTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_changes_share_a_key() {
        let pos = Position::new(2, 3);
        let add = Change::new(
            "default",
            ChangeKind::CellAdd {
                position: pos,
                value: CellValue::Number(1.0),
                formula: None,
                format: None,
            },
        );
        let delete = Change::new("default", ChangeKind::CellDelete { position: pos });
        assert_eq!(add.key(), delete.key());
    }

    #[test]
    fn different_sheets_have_different_keys() {
        let pos = Position::new(0, 0);
        let a = Change::new("a", ChangeKind::CellDelete { position: pos });
        let b = Change::new("b", ChangeKind::CellDelete { position: pos });
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn column_changes_key_on_id() {
        let update = Change::new(
            "s",
            ChangeKind::ColumnUpdate {
                meta: ColumnMeta::new("col_1", "Price", 0),
            },
        );
        let delete = Change::new(
            "s",
            ChangeKind::ColumnDelete {
                id: "col_1".into(),
            },
        );
        let other = Change::new(
            "s",
            ChangeKind::ColumnDelete {
                id: "col_2".into(),
            },
        );
        assert_eq!(update.key(), delete.key());
        assert_ne!(update.key(), other.key());
    }

    #[test]
    fn sort_keys_on_row_order() {
        let asc = Change::new(
            "s",
            ChangeKind::SortRows {
                column: 0,
                ascending: true,
            },
        );
        let desc = Change::new(
            "s",
            ChangeKind::SortRows {
                column: 4,
                ascending: false,
            },
        );
        assert_eq!(asc.key(), desc.key());
    }

    #[test]
    fn sheet_ops_share_a_key() {
        let add = Change::new("budget", ChangeKind::SheetAdd);
        let rename = Change::new(
            "budget",
            ChangeKind::SheetRename {
                to: "budget-2024".into(),
            },
        );
        assert_eq!(add.key(), rename.key());
    }

    #[test]
    fn add_or_delete_classification() {
        let pos = Position::new(0, 0);
        assert!(ChangeKind::CellDelete { position: pos }.is_cell_add_or_delete());
        assert!(!ChangeKind::CellUpdate {
            position: pos,
            value: CellValue::Null,
            formula: None,
            format: None
        }
        .is_cell_add_or_delete());
    }
}
