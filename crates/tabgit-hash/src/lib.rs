//! Canonical serialization and content hashing for tabgit objects.
//!
//! Object identity in tabgit is the SHA-1 hash of a canonical JSON form:
//! object keys sorted ascending, arrays in order, dates as RFC 3339 strings.
//! Two structurally equal values always produce the same bytes regardless of
//! construction or insertion order, so the hash is the sole identity
//! mechanism — no separate id field exists on any stored object.
//!
//! # Key Items
//!
//! - [`canonical_json`] — Deterministic JSON serialization
//! - [`ContentHasher`] — Domain-separated SHA-1 hasher, one tag per object kind
//! - [`deep_equal`] — Canonical-form structural equality

pub mod canonical;
pub mod hasher;

pub use canonical::{canonical_json, deep_equal, to_canonical_string};
pub use hasher::{ContentHasher, HashError};
