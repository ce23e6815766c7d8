use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tabgit_hash::{to_canonical_string, ContentHasher};
use tabgit_types::{Author, CellFormat, CellValue, ObjectId};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// One cell: value, formula, format.
    Cell,
    /// Column/row metadata registries with explicit ordering.
    Structure,
    /// One sheet's sparse cell grid plus a structure reference.
    Sheet,
    /// The ordered set of named sheets.
    Table,
    /// Snapshot pointer forming the history chain.
    Commit,
    /// Named pointer to a commit.
    Tag,
}

impl ObjectKind {
    fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Cell => &ContentHasher::CELL,
            Self::Structure => &ContentHasher::STRUCTURE,
            Self::Sheet => &ContentHasher::SHEET,
            Self::Table => &ContentHasher::TABLE,
            Self::Commit => &ContentHasher::COMMIT,
            Self::Tag => &ContentHasher::TAG,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cell => write!(f, "cell"),
            Self::Structure => write!(f, "structure"),
            Self::Sheet => write!(f, "sheet"),
            Self::Table => write!(f, "table"),
            Self::Commit => write!(f, "commit"),
            Self::Tag => write!(f, "tag"),
        }
    }
}

/// A stored object: kind tag + canonical serialized data + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// contents of the data — it is a pure key-value store keyed by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The canonical serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    ///
    /// Uses the domain-separated hasher for the object's kind, so objects of
    /// different kinds never collide even with identical bytes.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }
}

/// Encode a model value into a `StoredObject` via canonical serialization.
pub(crate) fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<StoredObject> {
    let canonical = to_canonical_string(value)?;
    Ok(StoredObject::new(kind, canonical.into_bytes()))
}

/// Decode a model value from a `StoredObject`, checking the kind tag.
pub(crate) fn decode<T: DeserializeOwned>(
    expected: ObjectKind,
    obj: &StoredObject,
) -> StoreResult<T> {
    if obj.kind != expected {
        return Err(StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: format!("expected {expected}, got {}", obj.kind),
        });
    }
    serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// CellObject
// ---------------------------------------------------------------------------

/// One cell's content: position, value, optional formula and format.
///
/// Identity is the hash of all fields, so a cell at a different position —
/// or the same content after a row shift — is a different object. Old
/// versions stay reachable through historical commits' trees; nothing is
/// ever garbage collected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellObject {
    pub row: u32,
    pub column: u32,
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<CellFormat>,
}

impl CellObject {
    /// Create a new cell object.
    pub fn new(
        row: u32,
        column: u32,
        value: CellValue,
        formula: Option<String>,
        format: Option<CellFormat>,
    ) -> Self {
        Self {
            row,
            column,
            value,
            formula,
            format,
        }
    }

    /// Content-addressed ID of this cell.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Cell, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::Cell, obj)
    }
}

// ---------------------------------------------------------------------------
// CommitObject
// ---------------------------------------------------------------------------

/// A snapshot pointer: table tree hash, parent link, authorship, message.
///
/// Commits form a singly-linked chain through `parent`; the first commit has
/// no parent. The timestamp participates in the hash, so commits are never
/// content-deduplicated across time even when the tree is identical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitObject {
    /// Hash of the [`crate::TableTree`] this commit snapshots.
    pub tree: ObjectId,
    /// Hash of the parent commit, absent for the initial commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ObjectId>,
    pub author: Author,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitObject {
    pub fn new(
        tree: ObjectId,
        parent: Option<ObjectId>,
        author: Author,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            tree,
            parent,
            author,
            message: message.into(),
            timestamp,
        }
    }

    /// Content-addressed ID of this commit.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Commit, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::Commit, obj)
    }
}

// ---------------------------------------------------------------------------
// TagObject
// ---------------------------------------------------------------------------

/// A named pointer to a commit.
///
/// Annotated tags carry a message and author; lightweight tags carry
/// neither. Both are content-addressed objects so every named pointer stays
/// verifiable through the object graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagObject {
    pub name: String,
    /// Hash of the target commit.
    pub target: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub timestamp: DateTime<Utc>,
}

impl TagObject {
    /// Create a lightweight tag.
    pub fn lightweight(name: impl Into<String>, target: ObjectId, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            target,
            message: None,
            author: None,
            timestamp,
        }
    }

    /// Create an annotated tag.
    pub fn annotated(
        name: impl Into<String>,
        target: ObjectId,
        message: impl Into<String>,
        author: Author,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            message: Some(message.into()),
            author: Some(author),
            timestamp,
        }
    }

    /// Annotated tags carry a message; lightweight tags do not.
    pub fn is_annotated(&self) -> bool {
        self.message.is_some()
    }

    /// Content-addressed ID of this tag.
    pub fn compute_id(&self) -> StoreResult<ObjectId> {
        Ok(self.to_stored_object()?.compute_id())
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        encode(ObjectKind::Tag, self)
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        decode(ObjectKind::Tag, obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn author() -> Author {
        Author::new("Ada", "ada@example.com")
    }

    #[test]
    fn cell_roundtrip() {
        let cell = CellObject::new(2, 3, CellValue::Number(6999.0), None, None);
        let stored = cell.to_stored_object().unwrap();
        let decoded = CellObject::from_stored_object(&stored).unwrap();
        assert_eq!(cell, decoded);
    }

    #[test]
    fn cell_kind_mismatch() {
        let cell = CellObject::new(0, 0, CellValue::Null, None, None);
        let mut stored = cell.to_stored_object().unwrap();
        stored.kind = ObjectKind::Commit;
        let err = CellObject::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn cell_id_covers_all_fields() {
        let base = CellObject::new(1, 1, CellValue::Text("a".into()), None, None);
        let moved = CellObject::new(2, 1, CellValue::Text("a".into()), None, None);
        let with_formula =
            CellObject::new(1, 1, CellValue::Text("a".into()), Some("=A1".into()), None);
        let id = base.compute_id().unwrap();
        assert_ne!(id, moved.compute_id().unwrap());
        assert_ne!(id, with_formula.compute_id().unwrap());
    }

    #[test]
    fn cell_id_deterministic() {
        let cell = CellObject::new(5, 8, CellValue::Bool(true), None, None);
        assert_eq!(cell.compute_id().unwrap(), cell.compute_id().unwrap());
    }

    #[test]
    fn commit_roundtrip() {
        let commit = CommitObject::new(
            ObjectId::from_bytes(b"tree"),
            Some(ObjectId::from_bytes(b"parent")),
            author(),
            "add price column",
            ts(),
        );
        let stored = commit.to_stored_object().unwrap();
        let decoded = CommitObject::from_stored_object(&stored).unwrap();
        assert_eq!(commit, decoded);
    }

    #[test]
    fn commit_hash_covers_timestamp() {
        let tree = ObjectId::from_bytes(b"tree");
        let a = CommitObject::new(tree, None, author(), "same", ts());
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 1).unwrap();
        let b = CommitObject::new(tree, None, author(), "same", later);
        assert_ne!(a.compute_id().unwrap(), b.compute_id().unwrap());
    }

    #[test]
    fn initial_commit_has_no_parent() {
        let commit = CommitObject::new(ObjectId::from_bytes(b"t"), None, author(), "init", ts());
        assert!(commit.parent.is_none());
        // Absent parent is omitted from the canonical bytes entirely.
        let stored = commit.to_stored_object().unwrap();
        assert!(!String::from_utf8(stored.data).unwrap().contains("parent"));
    }

    #[test]
    fn lightweight_vs_annotated_tag() {
        let target = ObjectId::from_bytes(b"commit");
        let light = TagObject::lightweight("v1.0", target, ts());
        let annotated = TagObject::annotated("v1.0", target, "first release", author(), ts());
        assert!(!light.is_annotated());
        assert!(annotated.is_annotated());
        assert_ne!(
            light.compute_id().unwrap(),
            annotated.compute_id().unwrap()
        );
    }

    #[test]
    fn tag_roundtrip() {
        let tag = TagObject::annotated(
            "v2.0",
            ObjectId::from_bytes(b"c"),
            "second release",
            author(),
            ts(),
        );
        let stored = tag.to_stored_object().unwrap();
        let decoded = TagObject::from_stored_object(&stored).unwrap();
        assert_eq!(tag, decoded);
    }

    #[test]
    fn kinds_do_not_collide() {
        let data = b"same bytes".to_vec();
        let a = StoredObject::new(ObjectKind::Cell, data.clone());
        let b = StoredObject::new(ObjectKind::Commit, data);
        assert_ne!(a.compute_id(), b.compute_id());
    }

    #[test]
    fn object_kind_display() {
        assert_eq!(format!("{}", ObjectKind::Cell), "cell");
        assert_eq!(format!("{}", ObjectKind::Structure), "structure");
        assert_eq!(format!("{}", ObjectKind::Sheet), "sheet");
        assert_eq!(format!("{}", ObjectKind::Table), "table");
        assert_eq!(format!("{}", ObjectKind::Commit), "commit");
        assert_eq!(format!("{}", ObjectKind::Tag), "tag");
    }
}
