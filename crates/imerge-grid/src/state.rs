use imerge_vcs::Oid;

use crate::grid::Grid;

/// The shape of history simplification produces (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Full,
    Rebase,
    RebaseWithHistory,
    Border,
    BorderWithHistory,
    BorderWithHistory2,
    Merge,
    Drop,
    Revert,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Full => "full",
            Goal::Rebase => "rebase",
            Goal::RebaseWithHistory => "rebase-with-history",
            Goal::Border => "border",
            Goal::BorderWithHistory => "border-with-history",
            Goal::BorderWithHistory2 => "border-with-history2",
            Goal::Merge => "merge",
            Goal::Drop => "drop",
            Goal::Revert => "revert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "full" => Goal::Full,
            "rebase" => Goal::Rebase,
            "rebase-with-history" => Goal::RebaseWithHistory,
            "border" => Goal::Border,
            "border-with-history" => Goal::BorderWithHistory,
            "border-with-history2" => Goal::BorderWithHistory2,
            "merge" => Goal::Merge,
            "drop" => Goal::Drop,
            "revert" => Goal::Revert,
            _ => return None,
        })
    }
}

/// Goal-specific parameters (§3's `goalopts`). Only `drop` populates `base`
/// today (§4.11): the pre-revert commit the final fast-forward check should
/// compare against instead of the synthetic revert chain's own base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalOpts {
    pub base: Option<Oid>,
}

impl GoalOpts {
    pub fn is_empty(&self) -> bool {
        self.base.is_none()
    }
}

/// Owns the grid plus the merge's identity and configuration (§3).
pub struct MergeState {
    pub name: String,
    pub tip1: Oid,
    pub tip2: Oid,
    pub goal: Goal,
    pub goalopts: GoalOpts,
    /// Forces the `Manual` frontier strategy even where automation could
    /// otherwise proceed.
    pub manual: bool,
    /// Final-result ref name (under `refs/heads/`), without the prefix.
    pub branch: String,
    pub grid: Grid,
}

impl MergeState {
    pub fn new(
        name: String,
        tip1: Oid,
        tip2: Oid,
        goal: Goal,
        goalopts: GoalOpts,
        manual: bool,
        branch: String,
        grid: Grid,
    ) -> Self {
        Self {
            name,
            tip1,
            tip2,
            goal,
            goalopts,
            manual,
            branch,
            grid,
        }
    }

    /// Every `(i1, i2)` currently flagged blocked, in row-major order,
    /// matching the `blockers` field of the state blob.
    pub fn blockers(&self) -> Vec<(usize, usize)> {
        self.grid
            .coords()
            .filter(|&(i1, i2)| self.grid.get(i1, i2).blocked)
            .collect()
    }
}
