//! The [`TableGit`] repository engine.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tabgit_diff::{diff_commits, TableDiff};
use tabgit_index::{Change, ChangeKey, ChangeKind, ChangeTarget, StageIndex};
use tabgit_merge::{merge_commits, MergeOutcome};
use tabgit_refs::{Head, InMemoryRefStore, Ref, RefStore};
use tabgit_store::{
    io, CellObject, ColumnMeta, CommitObject, InMemoryObjectStore, ObjectKind, ObjectStore,
    RowMeta, SheetTree, TagObject,
};
use tabgit_types::{Author, CellFormat, CellValue, ObjectId, Position};

use crate::error::{RepoError, RepoResult};
use crate::snapshot::TableSnapshot;
use crate::worktree::Worktree;

/// Summary of the repository's current state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Current branch name, or `"detached@<hash>"` when HEAD is detached.
    pub branch: String,
    /// Number of staged changes.
    pub staged_changes: usize,
    /// Short hash of the checked-out commit.
    pub last_commit: Option<String>,
}

/// The repository engine: object store, refs, staging index, working tree.
///
/// A repository is always in exactly one of two states: **attached** (HEAD
/// names a branch that tracks new commits) or **detached** (HEAD is a raw
/// commit hash; committing is disallowed). All mutations take `&mut self`
/// and apply atomically — a failed call leaves every piece of state as it
/// was.
pub struct TableGit {
    store: InMemoryObjectStore,
    refs: InMemoryRefStore,
    index: StageIndex,
    worktree: Worktree,
}

impl Default for TableGit {
    fn default() -> Self {
        Self::new()
    }
}

impl TableGit {
    /// Create an uninitialized repository. Call [`init`](Self::init) next.
    pub fn new() -> Self {
        Self {
            store: InMemoryObjectStore::new(),
            refs: InMemoryRefStore::new(),
            index: StageIndex::new(),
            worktree: Worktree::new(),
        }
    }

    /// Initialize the repository: creates a `default` sheet, an empty
    /// initial commit, the first branch ref, and HEAD.
    ///
    /// Calling `init` on an already-initialized repository is an error.
    pub fn init(&mut self, branch: &str) -> RepoResult<()> {
        if self.refs.head()?.is_some() {
            return Err(RepoError::AlreadyInitialized);
        }

        let mut worktree = Worktree::new();
        worktree.insert_sheet("default", SheetTree::new())?;
        let table = worktree.write_objects(&self.store)?;
        let table_id = io::write_table(&self.store, &table)?;

        let commit = CommitObject::new(
            table_id,
            None,
            Author::new("tabgit", "init@tabgit"),
            "Initial commit",
            Utc::now(),
        );
        let commit_id = io::write_commit(&self.store, &commit)?;

        self.refs.write_ref(
            &format!("refs/heads/{branch}"),
            &Ref::Branch {
                name: branch.to_string(),
                commit: commit_id,
            },
        )?;
        self.refs.set_head(branch)?;
        self.worktree = worktree;

        debug!(branch, commit = %commit_id.short_hex(), "initialized repository");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Staging
    // ---------------------------------------------------------------

    /// Stage a cell write.
    ///
    /// Classified as an add when the working tree has no cell at the
    /// position, or when the change already staged at this key is itself an
    /// add or delete; otherwise as an update. Repeated edits before a
    /// commit therefore still report "added" if the cell did not exist at
    /// commit-start.
    pub fn add_cell_change(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: CellValue,
        formula: Option<String>,
        format: Option<CellFormat>,
    ) {
        let position = Position::new(row, col);
        let key = ChangeKey {
            sheet: sheet.to_string(),
            target: ChangeTarget::Cell(position),
        };

        let in_worktree = self
            .worktree
            .sheet(sheet)
            .map(|s| s.cell(position).is_some())
            .unwrap_or(false);
        let staged_add_or_delete = self
            .index
            .get(&key)
            .map(|c| c.kind.is_cell_add_or_delete())
            .unwrap_or(false);

        let kind = if !in_worktree || staged_add_or_delete {
            ChangeKind::CellAdd {
                position,
                value,
                formula,
                format,
            }
        } else {
            ChangeKind::CellUpdate {
                position,
                value,
                formula,
                format,
            }
        };
        self.index.stage(Change::new(sheet, kind));
    }

    /// Stage a cell deletion, overwriting any prior staged change at the
    /// same position.
    pub fn delete_cell_change(&mut self, sheet: &str, row: u32, col: u32) {
        self.index.stage(Change::new(
            sheet,
            ChangeKind::CellDelete {
                position: Position::new(row, col),
            },
        ));
    }

    /// Stage a column addition. No duplicate-id validation happens here;
    /// validation runs when the change folds into the tree at commit time.
    pub fn add_column(&mut self, sheet: &str, meta: ColumnMeta) {
        self.index
            .stage(Change::new(sheet, ChangeKind::ColumnAdd { meta }));
    }

    /// Stage a column metadata update.
    pub fn update_column(&mut self, sheet: &str, meta: ColumnMeta) {
        self.index
            .stage(Change::new(sheet, ChangeKind::ColumnUpdate { meta }));
    }

    /// Stage a column deletion.
    pub fn delete_column(&mut self, sheet: &str, id: &str) {
        self.index.stage(Change::new(
            sheet,
            ChangeKind::ColumnDelete { id: id.to_string() },
        ));
    }

    /// Stage a column move to a new position index.
    pub fn move_column(&mut self, sheet: &str, id: &str, to: u32) {
        self.index.stage(Change::new(
            sheet,
            ChangeKind::ColumnMove {
                id: id.to_string(),
                to,
            },
        ));
    }

    /// Stage a row addition.
    pub fn add_row(&mut self, sheet: &str, meta: RowMeta) {
        self.index
            .stage(Change::new(sheet, ChangeKind::RowAdd { meta }));
    }

    /// Stage a row deletion.
    pub fn delete_row(&mut self, sheet: &str, id: &str) {
        self.index.stage(Change::new(
            sheet,
            ChangeKind::RowDelete { id: id.to_string() },
        ));
    }

    /// Stage a row sort by one column's values.
    pub fn sort_rows(&mut self, sheet: &str, column: u32, ascending: bool) {
        self.index.stage(Change::new(
            sheet,
            ChangeKind::SortRows { column, ascending },
        ));
    }

    /// Stage a new empty sheet.
    pub fn add_sheet(&mut self, name: &str) {
        self.index.stage(Change::new(name, ChangeKind::SheetAdd));
    }

    /// Stage a sheet deletion.
    pub fn delete_sheet(&mut self, name: &str) {
        self.index.stage(Change::new(name, ChangeKind::SheetDelete));
    }

    /// Stage a sheet rename.
    pub fn rename_sheet(&mut self, from: &str, to: &str) {
        self.index.stage(Change::new(
            from,
            ChangeKind::SheetRename { to: to.to_string() },
        ));
    }

    /// Discard all staged changes.
    pub fn reset_index(&mut self) {
        self.index.clear();
    }

    // ---------------------------------------------------------------
    // Commit
    // ---------------------------------------------------------------

    /// Fold the staged index into a new commit on the current branch.
    ///
    /// Changes fold in index insertion order onto per-sheet clones of the
    /// working tree, so multi-sheet staging commits atomically. Fails on an
    /// empty index and on a detached HEAD; a failed fold leaves the index,
    /// refs, and working tree untouched.
    pub fn commit(
        &mut self,
        message: &str,
        author: &str,
        email: &str,
    ) -> RepoResult<ObjectId> {
        let branch = match self.head()? {
            Head::Symbolic(branch) => branch,
            Head::Detached(_) => return Err(RepoError::DetachedHead),
        };
        if self.index.is_empty() {
            return Err(RepoError::EmptyIndex);
        }

        // Fold onto a clone; the live working tree stays valid on failure.
        let mut worktree = self.worktree.clone();
        for change in self.index.iter() {
            worktree.apply(change, &self.store)?;
        }

        let table = worktree.write_objects(&self.store)?;
        let table_id = io::write_table(&self.store, &table)?;

        let parent = self.branch_commit(&branch)?;
        let commit = CommitObject::new(
            table_id,
            Some(parent),
            Author::new(author, email),
            message,
            Utc::now(),
        );
        let commit_id = io::write_commit(&self.store, &commit)?;

        self.refs.write_ref(
            &format!("refs/heads/{branch}"),
            &Ref::Branch {
                name: branch.clone(),
                commit: commit_id,
            },
        )?;
        self.index.clear();
        // Reload from the stored commit rather than adopting the folded
        // clone, so the working tree always mirrors what a checkout reads.
        self.worktree = Worktree::load(&self.store, &table)?;

        debug!(
            branch = %branch,
            commit = %commit_id.short_hex(),
            "created commit"
        );
        Ok(commit_id)
    }

    // ---------------------------------------------------------------
    // Branches and checkout
    // ---------------------------------------------------------------

    /// Create a branch at the current HEAD commit.
    pub fn create_branch(&mut self, name: &str) -> RepoResult<()> {
        let commit = match self.refs.head()? {
            Some(_) => self.head_commit_id()?,
            None => return Err(RepoError::NoCommits),
        };
        if self.refs.read_ref(&format!("refs/heads/{name}"))?.is_some() {
            return Err(RepoError::BranchExists(name.to_string()));
        }
        self.refs.write_ref(
            &format!("refs/heads/{name}"),
            &Ref::Branch {
                name: name.to_string(),
                commit,
            },
        )?;
        debug!(branch = name, commit = %commit.short_hex(), "created branch");
        Ok(())
    }

    /// Switch to a branch (attached) or a commit hash (detached).
    ///
    /// Fails when the index holds staged changes, or when `target` is
    /// neither an existing branch nor a stored commit.
    pub fn checkout(&mut self, target: &str) -> RepoResult<()> {
        if !self.index.is_empty() {
            return Err(RepoError::DirtyIndex {
                staged: self.index.len(),
            });
        }

        if let Some(Ref::Branch { commit, .. }) =
            self.refs.read_ref(&format!("refs/heads/{target}"))?
        {
            let worktree = self.load_commit_worktree(&commit)?;
            self.refs.set_head(target)?;
            self.worktree = worktree;
            debug!(branch = target, "checked out branch");
            return Ok(());
        }

        if let Ok(id) = ObjectId::from_hex(target) {
            if let Some(obj) = self.store.read(&id)? {
                if obj.kind == ObjectKind::Commit {
                    let worktree = self.load_commit_worktree(&id)?;
                    self.refs.set_head_detached(id)?;
                    self.worktree = worktree;
                    debug!(commit = %id.short_hex(), "checked out commit (detached HEAD)");
                    return Ok(());
                }
            }
        }

        Err(RepoError::UnknownTarget(target.to_string()))
    }

    /// The current branch name; fails when HEAD is detached.
    pub fn current_branch(&self) -> RepoResult<String> {
        match self.head()? {
            Head::Symbolic(branch) => Ok(branch),
            Head::Detached(_) => Err(RepoError::DetachedHead),
        }
    }

    /// All branch names, sorted.
    pub fn list_branches(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .refs
            .branches()?
            .into_iter()
            .map(|(_, r)| r.short_name().to_string())
            .collect())
    }

    // ---------------------------------------------------------------
    // Tags
    // ---------------------------------------------------------------

    /// Create a tag at the current HEAD commit.
    ///
    /// A message makes the tag annotated; both forms materialize a stored
    /// tag object the ref points at. Tags are immutable once created.
    pub fn create_tag(
        &mut self,
        name: &str,
        message: Option<&str>,
        tagger: Option<Author>,
    ) -> RepoResult<ObjectId> {
        let target = self.head_commit_id()?;
        let tag = match message {
            Some(message) => TagObject::annotated(
                name,
                target,
                message,
                tagger.unwrap_or_else(|| Author::new("tabgit", "tags@tabgit")),
                Utc::now(),
            ),
            None => TagObject::lightweight(name, target, Utc::now()),
        };
        let tag_id = io::write_tag(&self.store, &tag)?;
        self.refs.write_ref(
            &format!("refs/tags/{name}"),
            &Ref::Tag {
                name: name.to_string(),
                tag: tag_id,
            },
        )?;
        Ok(tag_id)
    }

    /// Look up a tag by name.
    pub fn tag(&self, name: &str) -> RepoResult<TagObject> {
        match self.refs.read_ref(&format!("refs/tags/{name}"))? {
            Some(Ref::Tag { tag, .. }) => Ok(io::read_tag(&self.store, &tag)?),
            _ => Err(RepoError::TagNotFound(name.to_string())),
        }
    }

    /// All tags, sorted by name.
    pub fn list_tags(&self) -> RepoResult<Vec<TagObject>> {
        self.refs
            .tags()?
            .into_iter()
            .map(|(_, r)| Ok(io::read_tag(&self.store, &r.target())?))
            .collect()
    }

    /// Delete a tag by name.
    pub fn delete_tag(&mut self, name: &str) -> RepoResult<()> {
        if !self.refs.delete_ref(&format!("refs/tags/{name}"))? {
            return Err(RepoError::TagNotFound(name.to_string()));
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------

    /// Current branch, staged-change count, and last commit short hash.
    pub fn status(&self) -> RepoResult<Status> {
        let (branch, last_commit) = match self.head()? {
            Head::Symbolic(branch) => {
                let commit = self.branch_commit(&branch)?;
                (branch, Some(commit.short_hex()))
            }
            Head::Detached(commit) => {
                (format!("detached@{}", commit.short_hex()), Some(commit.short_hex()))
            }
        };
        Ok(Status {
            branch,
            staged_changes: self.index.len(),
            last_commit,
        })
    }

    /// Walk the parent chain from HEAD, newest first, up to `limit` commits.
    pub fn commit_history(&self, limit: usize) -> RepoResult<Vec<CommitObject>> {
        let mut history = Vec::new();
        let mut cursor = Some(self.head_commit_id()?);
        while let Some(id) = cursor {
            if history.len() >= limit {
                break;
            }
            let commit = io::read_commit(&self.store, &id)?;
            cursor = commit.parent;
            history.push(commit);
        }
        Ok(history)
    }

    /// The cell object at a position in the live working tree.
    pub fn get_cell(&self, sheet: &str, row: u32, col: u32) -> RepoResult<Option<CellObject>> {
        let tree = self
            .worktree
            .sheet(sheet)
            .ok_or_else(|| RepoError::SheetNotFound(sheet.to_string()))?;
        match tree.cell(Position::new(row, col)) {
            Some(id) => Ok(Some(io::read_cell(&self.store, &id)?)),
            None => Ok(None),
        }
    }

    /// The cell value at a position in the live working tree.
    ///
    /// "No cell here" is an expected outcome, not an error.
    pub fn get_cell_value(&self, sheet: &str, row: u32, col: u32) -> RepoResult<Option<CellValue>> {
        Ok(self.get_cell(sheet, row, col)?.map(|c| c.value))
    }

    /// Sheet names in the working tree, in display order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.worktree.sheet_names().to_vec()
    }

    /// A read-only materialization of a historical commit's table, by
    /// branch name, tag name, or commit hash.
    pub fn tree_snapshot(&self, refspec: &str) -> RepoResult<Worktree> {
        let commit = self.resolve_refspec(refspec)?;
        self.load_commit_worktree(&commit)
    }

    /// The current working tree, optionally with staged changes folded in
    /// provisionally. Repository state is never modified.
    pub fn preview_tree(&self, include_staged: bool) -> RepoResult<Worktree> {
        let mut preview = self.worktree.clone();
        if include_staged {
            for change in self.index.iter() {
                preview.apply(change, &self.store)?;
            }
        }
        Ok(preview)
    }

    /// The dense snapshot contract consumed by formatters and automation.
    pub fn snapshot(&self, sheet: &str) -> RepoResult<TableSnapshot> {
        let tree = self
            .worktree
            .sheet(sheet)
            .ok_or_else(|| RepoError::SheetNotFound(sheet.to_string()))?;
        let revision = Some(self.head_commit_id()?.short_hex());
        TableSnapshot::capture(&self.store, sheet, tree, revision)
    }

    // ---------------------------------------------------------------
    // Diff and merge
    // ---------------------------------------------------------------

    /// Diff two commits, each named by branch, tag, or commit hash.
    pub fn diff(&self, from: &str, to: &str) -> RepoResult<TableDiff> {
        let a = self.resolve_refspec(from)?;
        let b = self.resolve_refspec(to)?;
        Ok(diff_commits(&self.store, &a, &b)?)
    }

    /// Three-way merge of a branch into the current HEAD.
    ///
    /// Pure computation: reports conflicts (or a clean result) and never
    /// creates a merge commit — the caller decides how to finalize.
    pub fn merge(&self, branch: &str) -> RepoResult<MergeOutcome> {
        let target = match self.refs.read_ref(&format!("refs/heads/{branch}"))? {
            Some(Ref::Branch { commit, .. }) => commit,
            _ => return Err(RepoError::BranchNotFound(branch.to_string())),
        };
        let current = self.head_commit_id()?;
        Ok(merge_commits(&self.store, &current, &target)?)
    }

    /// The underlying object store (read-only access for advanced
    /// consumers such as serializers).
    pub fn store(&self) -> &InMemoryObjectStore {
        &self.store
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn head(&self) -> RepoResult<Head> {
        self.refs.head()?.ok_or(RepoError::NotInitialized)
    }

    /// The commit HEAD points at, through the branch ref when attached.
    fn head_commit_id(&self) -> RepoResult<ObjectId> {
        match self.head()? {
            Head::Symbolic(branch) => self.branch_commit(&branch),
            Head::Detached(commit) => Ok(commit),
        }
    }

    fn branch_commit(&self, branch: &str) -> RepoResult<ObjectId> {
        match self.refs.read_ref(&format!("refs/heads/{branch}"))? {
            Some(Ref::Branch { commit, .. }) => Ok(commit),
            _ => Err(RepoError::BranchNotFound(branch.to_string())),
        }
    }

    fn load_commit_worktree(&self, commit: &ObjectId) -> RepoResult<Worktree> {
        let commit = io::read_commit(&self.store, commit)?;
        let table = io::read_table(&self.store, &commit.tree)?;
        Worktree::load(&self.store, &table)
    }

    fn resolve_refspec(&self, refspec: &str) -> RepoResult<ObjectId> {
        if let Some(Ref::Branch { commit, .. }) =
            self.refs.read_ref(&format!("refs/heads/{refspec}"))?
        {
            return Ok(commit);
        }
        if let Some(Ref::Tag { tag, .. }) = self.refs.read_ref(&format!("refs/tags/{refspec}"))? {
            return Ok(io::read_tag(&self.store, &tag)?.target);
        }
        if let Ok(id) = ObjectId::from_hex(refspec) {
            if let Some(obj) = self.store.read(&id)? {
                if obj.kind == ObjectKind::Commit {
                    return Ok(id);
                }
            }
        }
        Err(RepoError::UnknownTarget(refspec.to_string()))
    }
}
