//! Merge engine for tabgit.
//!
//! Implements three-way merge with conflict detection at sheet, cell, and
//! structure granularity, plus stateless resolution strategies for the
//! conflicts it produces.
//!
//! The engine only reads commits' reachable graphs through the object
//! store; it never mutates repository state, and it never creates a merge
//! commit — a clean merge result is handed back to the caller to finalize.
//!
//! # Key Items
//!
//! - [`find_merge_base`] — BFS common-ancestor search over the commit graph
//! - [`merge_commits`] — Three-way merge producing a [`MergeOutcome`]
//! - [`Conflict`] / [`CellConflict`] / [`StructureConflict`] — Conflict data
//! - [`ConflictResolver`] / [`Strategy`] — Stateless strategy application

pub mod base;
pub mod conflict;
pub mod error;
pub mod merge;
pub mod resolve;

pub use base::find_merge_base;
pub use conflict::{
    CellConflict, Conflict, MergeSide, SheetConflict, SheetConflictKind, StructureConflict,
    StructureSides,
};
pub use error::{MergeError, MergeResult};
pub use merge::{merge_commits, MergeOutcome};
pub use resolve::{ConflictResolver, CustomResolution, ResolvedMeta, Strategy};
