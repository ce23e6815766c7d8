//! The read-only snapshot contract for external consumers.
//!
//! [`TableSnapshot`] is the sole channel through which formatters and
//! automation read table state: a dense 2-D value grid plus optional column
//! headers, fully decoupled from the object model's internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabgit_store::{io, ObjectStore, SheetTree};
use tabgit_types::{CellValue, Position};

use crate::error::RepoResult;

/// A dense, detached view of one sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// The sheet's name.
    pub sheet_id: String,
    /// Dense row-major value grid; empty cells are [`CellValue::Null`].
    pub rows: Vec<Vec<CellValue>>,
    /// Column display names in order, when the sheet declares columns.
    pub headers: Option<Vec<String>>,
    /// Short hash of the commit this view derives from, absent for views of
    /// uncommitted state.
    pub revision: Option<String>,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
}

impl TableSnapshot {
    /// Build a snapshot of one sheet, reading cell values from the store.
    pub fn capture(
        store: &dyn ObjectStore,
        sheet_id: impl Into<String>,
        sheet: &SheetTree,
        revision: Option<String>,
    ) -> RepoResult<Self> {
        let (row_count, col_count) = sheet.extent();

        let mut rows =
            vec![vec![CellValue::Null; col_count as usize]; row_count as usize];
        for row in 0..row_count {
            for col in 0..col_count {
                if let Some(id) = sheet.cell(Position::new(row, col)) {
                    rows[row as usize][col as usize] = io::read_cell(store, &id)?.value;
                }
            }
        }

        let headers = if sheet.structure().column_count() > 0 {
            Some(
                sheet
                    .structure()
                    .columns()
                    .map(|c| c.name.clone())
                    .collect(),
            )
        } else {
            None
        };

        Ok(Self {
            sheet_id: sheet_id.into(),
            rows,
            headers,
            revision,
            timestamp: Utc::now(),
        })
    }

    /// Grid dimensions as `(rows, columns)`.
    pub fn dimensions(&self) -> (usize, usize) {
        let cols = self.rows.first().map(Vec::len).unwrap_or(0);
        (self.rows.len(), cols)
    }
}
