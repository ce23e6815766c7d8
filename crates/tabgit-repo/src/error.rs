use thiserror::Error;

/// Errors surfaced by the repository engine.
///
/// Every failure leaves the repository exactly as it was: state changes are
/// applied only at the end of a successful operation.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("repository is already initialized")]
    AlreadyInitialized,

    #[error("repository is not initialized")]
    NotInitialized,

    #[error("nothing staged to commit")]
    EmptyIndex,

    #[error("cannot checkout with {staged} staged change(s); commit or clear the index first")]
    DirtyIndex { staged: usize },

    #[error("repository has no commits yet")]
    NoCommits,

    #[error("HEAD is detached; committing requires a checked-out branch")]
    DetachedHead,

    #[error("'{0}' does not exist as a branch, tag, or commit")]
    UnknownTarget(String),

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("sheet already exists: {0}")]
    SheetExists(String),

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error(transparent)]
    Store(#[from] tabgit_store::StoreError),

    #[error(transparent)]
    Refs(#[from] tabgit_refs::RefError),

    #[error(transparent)]
    Diff(#[from] tabgit_diff::DiffError),

    #[error(transparent)]
    Merge(#[from] tabgit_merge::MergeError),
}

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;
