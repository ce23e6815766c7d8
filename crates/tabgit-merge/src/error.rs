//! Error types for the merge crate.

/// Errors that can occur during merge operations.
///
/// A merge that finds no common ancestor or produces conflicts is not an
/// error — those are ordinary [`MergeOutcome`](crate::MergeOutcome) data.
/// Errors here mean the object graph itself could not be read.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] tabgit_store::StoreError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
