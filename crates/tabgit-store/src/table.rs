//! The versioned set and ordering of all sheets in a repository.
//!
//! [`TableTree`] maps sheet names to sheet tree hashes and keeps an explicit
//! order array. Renaming a sheet only rewrites the table tree's entry — the
//! underlying sheet object and its hash are untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabgit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{decode, encode, ObjectKind, StoredObject};

/// Ordered collection of named sheet references.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableTree {
    sheets: BTreeMap<String, ObjectId>,
    order: Vec<String>,
}

impl TableTree {
    /// Create an empty table tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet at the end of the order.
    pub fn add_sheet(&mut self, name: impl Into<String>, tree: ObjectId) -> StoreResult<()> {
        let name = name.into();
        if self.sheets.contains_key(&name) {
            return Err(StoreError::DuplicateId {
                kind: "sheet",
                id: name,
            });
        }
        self.order.push(name.clone());
        self.sheets.insert(name, tree);
        Ok(())
    }

    /// Remove a sheet, returning its tree hash.
    pub fn remove_sheet(&mut self, name: &str) -> StoreResult<ObjectId> {
        let tree = self.sheets.remove(name).ok_or(StoreError::UnknownId {
            kind: "sheet",
            id: name.to_string(),
        })?;
        self.order.retain(|n| n != name);
        Ok(tree)
    }

    /// Rename a sheet in place, keeping its position and tree hash.
    pub fn rename_sheet(&mut self, from: &str, to: impl Into<String>) -> StoreResult<()> {
        let to = to.into();
        if self.sheets.contains_key(&to) {
            return Err(StoreError::DuplicateId {
                kind: "sheet",
                id: to,
            });
        }
        let tree = self.sheets.remove(from).ok_or(StoreError::UnknownId {
            kind: "sheet",
            id: from.to_string(),
        })?;
        for name in &mut self.order {
            if name == from {
                *name = to.clone();
            }
        }
        self.sheets.insert(to, tree);
        Ok(())
    }

    /// Move a sheet to a new position index (clamped to the end).
    pub fn move_sheet(&mut self, name: &str, to: u32) -> StoreResult<()> {
        if !self.sheets.contains_key(name) {
            return Err(StoreError::UnknownId {
                kind: "sheet",
                id: name.to_string(),
            });
        }
        self.order.retain(|n| n != name);
        let index = (to as usize).min(self.order.len());
        self.order.insert(index, name.to_string());
        Ok(())
    }

    /// Update the tree hash a sheet points at.
    pub fn set_sheet(&mut self, name: &str, tree: ObjectId) -> StoreResult<()> {
        match self.sheets.get_mut(name) {
            Some(entry) => {
                *entry = tree;
                Ok(())
            }
            None => Err(StoreError::UnknownId {
                kind: "sheet",
                id: name.to_string(),
            }),
        }
    }

    /// The tree hash of a sheet, if present.
    pub fn sheet(&self, name: &str) -> Option<ObjectId> {
        self.sheets.get(name).copied()
    }

    /// Sheet names in display order.
    pub fn sheet_names(&self) -> &[String] {
        &self.order
    }

    /// Position of a sheet in the display order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Content-addressed ID covering the sheet map and the order array.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Table, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::Table, obj)
    }
}
