//! The tabgit repository engine.
//!
//! [`TableGit`] is the central state machine: it owns the object store, the
//! branch/tag refs and HEAD, the staging index, and a materialized working
//! tree (one mutable [`SheetTree`](tabgit_store::SheetTree) per sheet,
//! cloned from the checked-out commit).
//!
//! Data flow: mutation calls stage [`Change`](tabgit_index::Change) records
//! in the index; `commit()` folds the index onto clones of the working
//! sheets, stores the resulting objects, creates a commit pointing at them,
//! advances the branch ref, and reloads the working tree. Diff and merge
//! read commits' object graphs and never mutate repository state.
//!
//! A `TableGit` instance assumes a single logical writer: all mutation
//! methods take `&mut self`, so concurrent writes are unrepresentable in
//! safe Rust. Read-only views ([`TableGit::tree_snapshot`],
//! [`TableGit::preview_tree`], [`TableGit::snapshot`]) hand out detached
//! clones. Independent instances are fully isolated.

pub mod error;
pub mod repository;
pub mod snapshot;
pub mod worktree;

pub use error::{RepoError, RepoResult};
pub use repository::{Status, TableGit};
pub use snapshot::TableSnapshot;
pub use worktree::Worktree;
