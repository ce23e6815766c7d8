//! Staging index for tabgit.
//!
//! The index is the transient collection of not-yet-committed [`Change`]
//! records. It is purely in-memory and not content-addressed: a change
//! exists only until it is folded into a commit or the index is cleared.
//!
//! Changes are keyed so that repeated edits to the same target coalesce —
//! staging the same cell twice leaves exactly one effective change — while
//! the index preserves first-insertion order for deterministic commit
//! folding.
//!
//! # Key Types
//!
//! - [`ChangeKind`] — What is being changed (cell, column, row, sheet)
//! - [`Change`] — One staged change record
//! - [`ChangeKey`] — Coalescing key: sheet plus change target
//! - [`StageIndex`] — The insertion-ordered staging map

pub mod change;
pub mod index;

pub use change::{Change, ChangeKey, ChangeKind, ChangeTarget};
pub use index::StageIndex;
