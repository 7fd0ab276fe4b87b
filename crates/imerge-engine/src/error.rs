use imerge_grid::Oid;

/// Errors surfaced by the orchestrator (§7): everything a CLI entry point
/// needs to decide its own exit code and message.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{tip2} is already an ancestor of {tip1}; nothing to do")]
    NothingToDo { tip1: Oid, tip2: Oid },

    #[error("ancestry from {from} to {to} is not first-parent-linear")]
    NonlinearAncestry { from: Oid, to: Oid },

    #[error("conflict; suggest manual merge of {i1}-{i2}")]
    FrontierBlocked { i1: usize, i2: usize },

    #[error("manual merges requested; please merge {i1}-{i2}")]
    ManualMergeRequired { i1: usize, i2: usize },

    #[error("HEAD's merge commit does not resolve a blocker: {reason}")]
    ManualMergeUnusable { reason: String },

    #[error("no merge is in progress on the scratch branch")]
    NoMergeInProgress,

    #[error("the frontier is not yet complete; finish merging before simplifying")]
    FrontierIncomplete,

    #[error("refusing non-fast-forward update of refs/heads/{branch} (use force)")]
    NotFastForward { branch: String },

    #[error("rebase goal requires commits2 to contain no merge commits")]
    RebaseRequiresLinearSecondParent,

    #[error("goal \"drop\" was not initialized correctly: missing goalopts.base")]
    DropGoalMissingBase,

    #[error("no imerge is active; pass --name or set imerge.default")]
    NoDefaultMerge,

    #[error(transparent)]
    Grid(#[from] imerge_grid::GridError),

    #[error(transparent)]
    Frontier(#[from] imerge_frontier::FrontierError),

    #[error(transparent)]
    Reparent(#[from] imerge_reparent::ReparentError),

    #[error(transparent)]
    Vcs(#[from] imerge_vcs::VcsError),
}
