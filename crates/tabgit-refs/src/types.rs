//! Core reference types.
//!
//! References are named pointers into the object graph. Branches are mutable
//! tips; tags are immutable pointers to stored tag objects.

use serde::{Deserialize, Serialize};
use tabgit_types::ObjectId;

/// A named reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ref {
    /// A branch is a mutable pointer to a commit chain tip.
    ///
    /// Branches move forward as new commits are created.
    Branch {
        /// Human-readable branch name (e.g. "main", "feature/pricing").
        name: String,
        /// Hash of the commit at the tip of this branch.
        commit: ObjectId,
    },

    /// A tag is an immutable pointer to a stored tag object.
    ///
    /// Once created, tags cannot be moved. Delete and recreate if needed.
    Tag {
        /// Tag name (e.g. "v1.0.0").
        name: String,
        /// Hash of the stored tag object.
        tag: ObjectId,
    },
}

impl Ref {
    /// Returns the canonical name for this ref (e.g. "refs/heads/main").
    pub fn canonical_name(&self) -> String {
        match self {
            Ref::Branch { name, .. } => format!("refs/heads/{name}"),
            Ref::Tag { name, .. } => format!("refs/tags/{name}"),
        }
    }

    /// Returns the short name of this ref (without the refs/ prefix).
    pub fn short_name(&self) -> &str {
        match self {
            Ref::Branch { name, .. } => name,
            Ref::Tag { name, .. } => name,
        }
    }

    /// Returns `true` if this is a branch ref.
    pub fn is_branch(&self) -> bool {
        matches!(self, Ref::Branch { .. })
    }

    /// Returns `true` if this is a tag ref.
    pub fn is_tag(&self) -> bool {
        matches!(self, Ref::Tag { .. })
    }

    /// Returns the object hash this ref points to.
    pub fn target(&self) -> ObjectId {
        match self {
            Ref::Branch { commit, .. } => *commit,
            Ref::Tag { tag, .. } => *tag,
        }
    }
}

/// The state of HEAD: either symbolic (pointing to a branch) or detached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Head {
    /// HEAD points to a branch by name.
    Symbolic(String),
    /// HEAD is detached, pointing directly to a commit hash.
    Detached(ObjectId),
}

impl Head {
    /// The branch name, if attached.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Head::Symbolic(name) => Some(name),
            Head::Detached(_) => None,
        }
    }

    /// Returns `true` if HEAD is detached.
    pub fn is_detached(&self) -> bool {
        matches!(self, Head::Detached(_))
    }
}
