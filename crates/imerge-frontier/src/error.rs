use imerge_grid::Oid;

/// Error kinds owned by the frontier algorithm (§7.1): an outlining merge
/// that was predicted to succeed but didn't, and the terminal signals of
/// the auto-expansion loop.
#[derive(Debug, thiserror::Error)]
pub enum FrontierError {
    #[error("merge at ({i1},{i2}) failed though it was predicted to succeed")]
    UnexpectedMergeFailure { i1: usize, i2: usize },

    #[error("frontier blocked at ({i1},{i2})")]
    FrontierBlocked { i1: usize, i2: usize },

    /// Internal termination signal for `auto_complete_frontier` — caught
    /// and turned into a normal `Ok(())`, never surfaced to the user (§7.1).
    #[error("block complete")]
    BlockComplete,

    #[error("vertex at ({i1},{i2}) computed two different trees from its two edges")]
    InconsistentVertex { i1: usize, i2: usize, left_tree: Oid, right_tree: Oid },

    #[error(transparent)]
    Vcs(#[from] imerge_vcs::VcsError),
}
