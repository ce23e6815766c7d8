//! In-memory reference store.
//!
//! [`InMemoryRefStore`] stores all refs in a `HashMap` protected by a
//! `RwLock`. It implements the full [`RefStore`] trait; data is lost when
//! the store is dropped. Consumers that need durability serialize the
//! repository themselves.

use std::collections::HashMap;
use std::sync::RwLock;

use tabgit_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::{validate_branch_name, validate_tag_name};
use crate::traits::RefStore;
use crate::types::{Head, Ref};

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, Ref>>,
    head: RwLock<Option<Head>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let refs = self
            .refs
            .read()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
        Ok(refs.get(name).cloned())
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        // Validate names based on ref type.
        match reference {
            Ref::Branch { name: bname, .. } => validate_branch_name(bname)?,
            Ref::Tag { name: tname, .. } => validate_tag_name(tname)?,
        }

        let mut refs = self
            .refs
            .write()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;

        // Tags are immutable: if a tag already exists at this name, reject.
        if reference.is_tag() {
            if let Some(existing) = refs.get(name) {
                if existing.is_tag() {
                    return Err(RefError::TagImmutable {
                        name: name.to_string(),
                    });
                }
            }
        }

        refs.insert(name.to_string(), reference.clone());
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        // Prevent deleting the current branch.
        {
            let head = self
                .head
                .read()
                .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
            if let Some(Head::Symbolic(current)) = head.as_ref() {
                if name == format!("refs/heads/{current}") {
                    return Err(RefError::DeleteCurrentBranch {
                        name: current.clone(),
                    });
                }
            }
        }

        let mut refs = self
            .refs
            .write()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
        Ok(refs.remove(name).is_some())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        let refs = self
            .refs
            .read()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
        let mut result: Vec<(String, Ref)> = refs
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        result.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(result)
    }

    fn head(&self) -> Result<Option<Head>> {
        let head = self
            .head
            .read()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
        Ok(head.clone())
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let mut head = self
            .head
            .write()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
        *head = Some(Head::Symbolic(branch.to_string()));
        Ok(())
    }

    fn set_head_detached(&self, commit: ObjectId) -> Result<()> {
        let mut head = self
            .head
            .write()
            .map_err(|e| RefError::Storage(format!("lock poisoned: {e}")))?;
        *head = Some(Head::Detached(commit));
        Ok(())
    }
}
