//! Merge-base computation: the paint algorithm for finding lowest common
//! ancestors and testing ancestry between two commits.

mod merge_base;

pub use merge_base::{merge_base, merge_base_one, is_ancestor};

use git_hash::ObjectId;

/// Errors produced by merge-base computation.
#[derive(Debug, thiserror::Error)]
pub enum RevWalkError {
    #[error("commit not found: {0}")]
    CommitNotFound(ObjectId),

    #[error("object is not a commit: {0}")]
    NotACommit(ObjectId),

    #[error(transparent)]
    Odb(#[from] git_odb::OdbError),

    #[error(transparent)]
    Repo(#[from] git_repository::RepoError),

    #[error(transparent)]
    Object(#[from] git_object::ObjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
