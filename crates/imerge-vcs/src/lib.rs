//! The surface the pairwise-merge engine drives its underlying git plumbing
//! through. No caller outside this crate touches `git_repository::Repository`
//! directly.

mod git_vcs;
mod head_guard;

pub use git_vcs::GitVcs;
pub use head_guard::HeadGuard;

use bstr::BString;
use git_hash::ObjectId;
use git_utils::date::Signature;

/// A commit or tree identifier. Re-exported rather than reinvented: every
/// object this crate exchanges with its caller is already a `git_hash::ObjectId`.
pub type Oid = ObjectId;

/// Errors a `Vcs` operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("worktree has {kind} changes")]
    UncleanWorktree { kind: &'static str },

    #[error("invalid ref name {0:?}")]
    InvalidRefName(BString),

    #[error("invalid branch name {0:?}")]
    InvalidBranchName(BString),

    #[error("{spec:?} does not resolve to a commit")]
    NotACommit { spec: String },

    #[error("{spec:?} does not resolve to a blob")]
    NotABlob { spec: String },

    #[error("{spec:?} does not resolve to any object")]
    UnresolvedName { spec: String },

    #[error("no common ancestor between {a} and {b}")]
    NoMergeBase { a: Oid, b: Oid },

    #[error("{from} is not an ancestor of {to}, so no linear ancestry exists between them")]
    NotAncestor { from: Oid, to: Oid },

    #[error("ancestry between {from} and {to} is not first-parent-linear")]
    NonlinearAncestry { from: Oid, to: Oid },

    #[error("automatic merge of {a} and {b} failed")]
    AutomaticMergeFailed { a: Oid, b: Oid },

    #[error("no merge is currently in progress")]
    NoMergeInProgress,

    #[error(transparent)]
    Repo(#[from] git_repository::RepoError),

    #[error(transparent)]
    Odb(#[from] git_odb::OdbError),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),

    #[error(transparent)]
    Ref(#[from] git_ref::RefError),

    #[error(transparent)]
    RevWalk(#[from] git_revwalk::RevWalkError),

    #[error(transparent)]
    Merge(#[from] git_merge::MergeError),

    #[error(transparent)]
    Diff(#[from] git_diff::DiffError),

    #[error(transparent)]
    Index(#[from] git_index::IndexError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Author/committer identity, reusing the teacher's `Signature` rather than
/// defining a parallel (name, email, date) tuple type.
pub type AuthorTriplet = Signature;

/// Thin, well-defined surface over the underlying version-control system.
///
/// Every method is synchronous; failures are reported as a distinguishable
/// [`VcsError`] variant rather than a process exit code, since there is no
/// subprocess boundary in this workspace.
pub trait Vcs {
    /// Resolve an arbitrary ref/oid spec to an object id.
    fn resolve(&self, spec: &str) -> Result<Oid, VcsError>;

    /// Resolve a spec and require that it names a commit.
    fn commit_oid(&self, spec: &str) -> Result<Oid, VcsError>;

    /// Is `ancestor` an ancestor of (or equal to) `descendant`?
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, VcsError>;

    /// The merge base of `a` and `b` closest to the tips, by fewest
    /// non-merge commits on the path (see DESIGN.md for the tie-break rule
    /// among multiple lowest common ancestors).
    fn merge_base_best(&self, a: &Oid, b: &Oid) -> Result<Oid, VcsError>;

    /// The first-parent linear ancestry from `from` (exclusive... no,
    /// inclusive) to `to`, in chronological order, both endpoints included.
    /// Fails with `NotAncestor` if `from` is not an ancestor of `to`, and
    /// with `NonlinearAncestry` if the path has merge commits and
    /// `first_parent` is false.
    fn linear_ancestry(&self, from: &Oid, to: &Oid, first_parent: bool) -> Result<Vec<Oid>, VcsError>;

    /// Attempt a clean automatic merge of `a` and `b`, committing the result.
    /// Requires a clean worktree; on conflict, aborts and leaves the tree
    /// clean, returning `AutomaticMergeFailed`.
    fn auto_merge(&mut self, a: &Oid, b: &Oid, msg: Option<&str>) -> Result<Oid, VcsError>;

    /// Begin a merge of `b` into `a` without committing, expected to
    /// conflict; leaves the index and working tree in conflicted state for
    /// the user to resolve by hand.
    fn manual_merge_prepare(&mut self, a: &Oid, b: &Oid, msg: &str) -> Result<(), VcsError>;

    /// Create a commit with the given tree, parents, and message.
    fn commit_tree(
        &mut self,
        tree: &Oid,
        parents: &[Oid],
        msg: &str,
        author: Option<&AuthorTriplet>,
    ) -> Result<Oid, VcsError>;

    fn get_tree(&self, oid: &Oid) -> Result<Oid, VcsError>;
    fn parents(&self, oid: &Oid) -> Result<Vec<Oid>, VcsError>;
    fn log_message(&self, oid: &Oid) -> Result<BString, VcsError>;
    fn author_triplet(&self, oid: &Oid) -> Result<AuthorTriplet, VcsError>;

    /// Write raw bytes as a blob object, returning its oid. Used for the
    /// state-blob ref, which names a blob rather than a commit.
    fn write_blob(&mut self, data: &[u8]) -> Result<Oid, VcsError>;
    /// Read back a blob's raw bytes.
    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, VcsError>;

    fn read_ref(&self, name: &str) -> Result<Option<Oid>, VcsError>;
    fn update_ref(&mut self, name: &str, target: Oid, msg: &str) -> Result<(), VcsError>;
    fn delete_ref(&mut self, name: &str) -> Result<(), VcsError>;
    /// Enumerate (full ref name, oid) pairs under `prefix`, sorted by name.
    fn for_each_ref(&self, prefix: &str) -> Result<Vec<(String, Oid)>, VcsError>;

    /// Fail with `UncleanWorktree` if the index has staged changes against
    /// HEAD, or the worktree has unstaged changes against the index.
    fn require_clean_worktree(&mut self) -> Result<(), VcsError>;
    /// Point HEAD directly at its current commit, losing the symbolic ref.
    fn detach_head(&mut self) -> Result<(), VcsError>;
    /// Check out `reference` (branch or oid), updating HEAD and materializing
    /// its tree into the working copy.
    fn checkout(&mut self, reference: &str, quiet: bool) -> Result<(), VcsError>;
    /// Move HEAD (and whatever it points to) to `oid`, resetting the index
    /// and working tree to match.
    fn reset_hard(&mut self, oid: &Oid) -> Result<(), VcsError>;
    /// Abort an in-progress manual merge, restoring the pre-merge worktree.
    fn abort_merge(&mut self) -> Result<(), VcsError>;

    /// Rebuild `oid` with the same tree and author but new `parents`
    /// (optionally overriding the message).
    fn reparent(&mut self, oid: &Oid, parents: &[Oid], msg: Option<&str>) -> Result<Oid, VcsError>;

    /// Build a commit on top of `onto` whose tree is `onto`'s tree with
    /// `target`'s changes inverted — i.e. a revert of `target`, applied as a
    /// three-way merge with `ours = onto`, `theirs = target's parent`,
    /// `base = target`.
    fn revert_commit(&mut self, onto: &Oid, target: &Oid) -> Result<Oid, VcsError>;

    /// Read the commit HEAD currently points at, and whether it does so
    /// through a symbolic ref (and if so, which one).
    fn head_state(&self) -> Result<HeadState, VcsError>;

    /// If `manual_merge_prepare` left a merge in progress (`MERGE_HEAD`
    /// exists) and the index has no remaining conflicts, commit the staged
    /// resolution with parents `[HEAD, MERGE_HEAD]`, taking the message from
    /// `MERGE_MSG`, and clean up the merge state files. If `edit` is set,
    /// the configured editor (`imerge.editmergemessages`, overridable with
    /// `--edit`/`--no-edit`) is opened on `MERGE_MSG` first. Returns `None`
    /// if no merge is in progress, so callers can tell "already committed by
    /// hand" from "nothing to do".
    fn commit_pending_merge(&mut self, edit: bool) -> Result<Option<Oid>, VcsError>;
}

/// Where HEAD currently points, for `HeadGuard` to restore later.
#[derive(Debug, Clone)]
pub enum HeadState {
    Symbolic(String),
    Detached(Oid),
    Unborn,
}
