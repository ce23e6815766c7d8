//! Column and row metadata registries.
//!
//! [`TableStructure`] owns two metadata maps plus two explicit order arrays.
//! The order arrays are authoritative for position: they always contain
//! exactly the keys of the corresponding map, and every mutation renumbers
//! each entry's `order` field to match its index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabgit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{decode, encode, ObjectKind, StoredObject};

/// Declared data type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDataType {
    Text,
    Number,
    Boolean,
    Date,
    Formula,
}

/// Optional validation constraints on a column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnConstraints {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ColumnConstraints {
    /// Shallow merge: `self`'s set fields win, `other` fills the gaps.
    pub fn merge_over(&self, other: &ColumnConstraints) -> ColumnConstraints {
        ColumnConstraints {
            required: self.required || other.required,
            unique: self.unique || other.unique,
            min: self.min.or(other.min),
            max: self.max.or(other.max),
        }
    }
}

/// Metadata for one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Position index; kept equal to this column's index in the order array.
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<ColumnDataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ColumnConstraints>,
}

impl ColumnMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            order,
            width: None,
            hidden: false,
            data_type: None,
            constraints: None,
        }
    }
}

/// Metadata for one row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowMeta {
    pub id: String,
    /// Position index; kept equal to this row's index in the order array.
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl RowMeta {
    pub fn new(id: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            order,
            height: None,
            hidden: false,
        }
    }
}

/// Ordered column/row metadata registries.
///
/// Invariant: `column_order`/`row_order` contain exactly the keys of
/// `columns`/`rows`, and each entry's `order` field equals its index in the
/// array. All mutations go through the methods below, which re-establish the
/// invariant before returning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableStructure {
    columns: BTreeMap<String, ColumnMeta>,
    rows: BTreeMap<String, RowMeta>,
    column_order: Vec<String>,
    row_order: Vec<String>,
}

impl TableStructure {
    /// Create an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Column operations
    // ---------------------------------------------------------------

    /// Add a column, inserted at the position named by `meta.order`
    /// (clamped to the end).
    pub fn add_column(&mut self, meta: ColumnMeta) -> StoreResult<()> {
        if self.columns.contains_key(&meta.id) {
            return Err(StoreError::DuplicateId {
                kind: "column",
                id: meta.id,
            });
        }
        let index = (meta.order as usize).min(self.column_order.len());
        self.column_order.insert(index, meta.id.clone());
        self.columns.insert(meta.id.clone(), meta);
        self.renumber_columns();
        Ok(())
    }

    /// Replace a column's metadata, preserving its current position.
    ///
    /// Position changes go through [`move_column`](Self::move_column); the
    /// incoming `order` field is ignored.
    pub fn update_column(&mut self, mut meta: ColumnMeta) -> StoreResult<()> {
        let existing = self.columns.get(&meta.id).ok_or(StoreError::UnknownId {
            kind: "column",
            id: meta.id.clone(),
        })?;
        meta.order = existing.order;
        self.columns.insert(meta.id.clone(), meta);
        Ok(())
    }

    /// Remove a column, returning its metadata (with its pre-removal order).
    pub fn remove_column(&mut self, id: &str) -> StoreResult<ColumnMeta> {
        let meta = self.columns.remove(id).ok_or(StoreError::UnknownId {
            kind: "column",
            id: id.to_string(),
        })?;
        self.column_order.retain(|c| c != id);
        self.renumber_columns();
        Ok(meta)
    }

    /// Move a column to a new position index (clamped to the end).
    ///
    /// Moving affects presentation order only; cell coordinates are not
    /// touched. Coordinate-shifting edits live on the sheet tree.
    pub fn move_column(&mut self, id: &str, to: u32) -> StoreResult<()> {
        if !self.columns.contains_key(id) {
            return Err(StoreError::UnknownId {
                kind: "column",
                id: id.to_string(),
            });
        }
        self.column_order.retain(|c| c != id);
        let index = (to as usize).min(self.column_order.len());
        self.column_order.insert(index, id.to_string());
        self.renumber_columns();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Row operations
    // ---------------------------------------------------------------

    /// Add a row, inserted at the position named by `meta.order`
    /// (clamped to the end).
    pub fn add_row(&mut self, meta: RowMeta) -> StoreResult<()> {
        if self.rows.contains_key(&meta.id) {
            return Err(StoreError::DuplicateId {
                kind: "row",
                id: meta.id,
            });
        }
        let index = (meta.order as usize).min(self.row_order.len());
        self.row_order.insert(index, meta.id.clone());
        self.rows.insert(meta.id.clone(), meta);
        self.renumber_rows();
        Ok(())
    }

    /// Replace a row's metadata, preserving its current position.
    pub fn update_row(&mut self, mut meta: RowMeta) -> StoreResult<()> {
        let existing = self.rows.get(&meta.id).ok_or(StoreError::UnknownId {
            kind: "row",
            id: meta.id.clone(),
        })?;
        meta.order = existing.order;
        self.rows.insert(meta.id.clone(), meta);
        Ok(())
    }

    /// Remove a row, returning its metadata (with its pre-removal order).
    pub fn remove_row(&mut self, id: &str) -> StoreResult<RowMeta> {
        let meta = self.rows.remove(id).ok_or(StoreError::UnknownId {
            kind: "row",
            id: id.to_string(),
        })?;
        self.row_order.retain(|r| r != id);
        self.renumber_rows();
        Ok(meta)
    }

    /// Move a row to a new position index (clamped to the end).
    pub fn move_row(&mut self, id: &str, to: u32) -> StoreResult<()> {
        if !self.rows.contains_key(id) {
            return Err(StoreError::UnknownId {
                kind: "row",
                id: id.to_string(),
            });
        }
        self.row_order.retain(|r| r != id);
        let index = (to as usize).min(self.row_order.len());
        self.row_order.insert(index, id.to_string());
        self.renumber_rows();
        Ok(())
    }

    /// Reorder rows wholesale by a permutation of position indices.
    ///
    /// `permutation[new_index] = old_index`. Used by row sorting.
    pub fn permute_rows(&mut self, permutation: &[usize]) {
        if permutation.len() != self.row_order.len() {
            return;
        }
        let old = self.row_order.clone();
        self.row_order = permutation.iter().map(|&i| old[i].clone()).collect();
        self.renumber_rows();
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn column(&self, id: &str) -> Option<&ColumnMeta> {
        self.columns.get(id)
    }

    pub fn row(&self, id: &str) -> Option<&RowMeta> {
        self.rows.get(id)
    }

    /// Column id at a position index.
    pub fn column_at(&self, index: u32) -> Option<&str> {
        self.column_order.get(index as usize).map(String::as_str)
    }

    /// Row id at a position index.
    pub fn row_at(&self, index: u32) -> Option<&str> {
        self.row_order.get(index as usize).map(String::as_str)
    }

    pub fn column_order(&self) -> &[String] {
        &self.column_order
    }

    pub fn row_order(&self) -> &[String] {
        &self.row_order
    }

    /// Columns in position order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.column_order.iter().filter_map(|id| self.columns.get(id))
    }

    /// Rows in position order.
    pub fn rows(&self) -> impl Iterator<Item = &RowMeta> {
        self.row_order.iter().filter_map(|id| self.rows.get(id))
    }

    pub fn column_count(&self) -> usize {
        self.column_order.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_order.len()
    }

    // ---------------------------------------------------------------
    // Storage
    // ---------------------------------------------------------------

    /// Content-addressed ID covering both maps and both order arrays.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Structure, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::Structure, obj)
    }

    fn renumber_columns(&mut self) {
        for (i, id) in self.column_order.iter().enumerate() {
            if let Some(meta) = self.columns.get_mut(id) {
                meta.order = i as u32;
            }
        }
    }

    fn renumber_rows(&mut self) {
        for (i, id) in self.row_order.iter().enumerate() {
            if let Some(meta) = self.rows.get_mut(id) {
                meta.order = i as u32;
            }
        }
    }
}
