use serde::Serialize;
use sha1::{Digest, Sha1};
use tabgit_types::ObjectId;

use crate::canonical::to_canonical_string;

/// Domain-separated SHA-1 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"tabgit-cell-v1"`) that is
/// prepended to every hash computation. This prevents cross-type hash
/// collisions: a cell and a commit with identical canonical bytes will
/// produce different hashes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for cell objects.
    pub const CELL: Self = Self {
        domain: "tabgit-cell-v1",
    };
    /// Hasher for table structure objects.
    pub const STRUCTURE: Self = Self {
        domain: "tabgit-structure-v1",
    };
    /// Hasher for sheet tree objects.
    pub const SHEET: Self = Self {
        domain: "tabgit-sheet-v1",
    };
    /// Hasher for table tree objects.
    pub const TABLE: Self = Self {
        domain: "tabgit-table-v1",
    };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self {
        domain: "tabgit-commit-v1",
    };
    /// Hasher for tag objects.
    pub const TAG: Self = Self {
        domain: "tabgit-tag-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(hasher.finalize().into())
    }

    /// Hash a serializable value in canonical form with domain separation.
    ///
    /// Structurally equal values hash identically regardless of field or
    /// key insertion order.
    pub fn hash_canonical<T: Serialize>(&self, value: &T) -> Result<ObjectId, HashError> {
        let canonical = to_canonical_string(value)?;
        Ok(self.hash(canonical.as_bytes()))
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
