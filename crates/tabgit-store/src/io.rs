//! Typed read/write helpers over the raw [`ObjectStore`].
//!
//! The store itself never interprets object contents; these functions layer
//! kind-checked encode/decode on top so the rest of the system works with
//! model types instead of byte blobs. A sheet is two objects — its structure
//! and its record — so [`write_sheet`] and [`read_sheet`] handle the pair.

use tabgit_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{CellObject, CommitObject, StoredObject, TagObject};
use crate::sheet::SheetTree;
use crate::structure::TableStructure;
use crate::table::TableTree;
use crate::traits::ObjectStore;

fn read_required(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<StoredObject> {
    store.read(id)?.ok_or(StoreError::NotFound(*id))
}

/// Write a cell object, returning its ID.
pub fn write_cell(store: &dyn ObjectStore, cell: &CellObject) -> StoreResult<ObjectId> {
    store.write(&cell.to_stored_object()?)
}

/// Read and decode a cell object.
pub fn read_cell(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<CellObject> {
    CellObject::from_stored_object(&read_required(store, id)?)
}

/// Write a structure object, returning its ID.
pub fn write_structure(store: &dyn ObjectStore, structure: &TableStructure) -> StoreResult<ObjectId> {
    store.write(&structure.to_stored_object()?)
}

/// Read and decode a structure object.
pub fn read_structure(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<TableStructure> {
    TableStructure::from_stored_object(&read_required(store, id)?)
}

/// Write a sheet and its structure, returning the sheet's ID.
///
/// Write-then-link: the structure object lands first, then the sheet record
/// that references it.
pub fn write_sheet(store: &dyn ObjectStore, sheet: &SheetTree) -> StoreResult<ObjectId> {
    write_structure(store, sheet.structure())?;
    store.write(&sheet.to_stored_object()?)
}

/// Read a sheet, resolving its structure reference.
pub fn read_sheet(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<SheetTree> {
    let record = SheetTree::record_from_stored_object(&read_required(store, id)?)?;
    let structure = read_structure(store, &record.structure)?;
    Ok(SheetTree::from_parts(record.cells, structure))
}

/// Write a table tree, returning its ID.
pub fn write_table(store: &dyn ObjectStore, table: &TableTree) -> StoreResult<ObjectId> {
    store.write(&table.to_stored_object()?)
}

/// Read and decode a table tree.
pub fn read_table(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<TableTree> {
    TableTree::from_stored_object(&read_required(store, id)?)
}

/// Write a commit object, returning its ID.
pub fn write_commit(store: &dyn ObjectStore, commit: &CommitObject) -> StoreResult<ObjectId> {
    store.write(&commit.to_stored_object()?)
}

/// Read and decode a commit object.
pub fn read_commit(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<CommitObject> {
    CommitObject::from_stored_object(&read_required(store, id)?)
}

/// Write a tag object, returning its ID.
pub fn write_tag(store: &dyn ObjectStore, tag: &TagObject) -> StoreResult<ObjectId> {
    store.write(&tag.to_stored_object()?)
}

/// Read and decode a tag object.
pub fn read_tag(store: &dyn ObjectStore, id: &ObjectId) -> StoreResult<TagObject> {
    TagObject::from_stored_object(&read_required(store, id)?)
}
