use anyhow::{bail, Result};
use clap::Args;
use imerge_engine::{orchestrator, revert, EngineError};
use imerge_vcs::Vcs;

use crate::context;

#[derive(Args)]
pub struct DropArgs {
    /// Name of the incremental merge to create
    #[arg(long)]
    pub name: Option<String>,

    /// Name of the branch to which the result will eventually be stored
    #[arg(long)]
    pub branch: Option<String>,

    /// Require every manual merge, disabling bisection
    #[arg(long)]
    pub manual: bool,

    #[arg(long = "first-parent", hide = true, default_value_t = true)]
    pub first_parent: bool,

    /// The commit(s) to drop, as `commit` (drops just that one) or
    /// `commit1..commit2` (drops the whole inclusive range)
    pub range: String,
}

/// Drop one or more commits out of the current branch's history, via
/// revert-and-rebase (§4.11).
pub fn run(args: &DropArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    vcs.require_clean_worktree()?;

    let Some(tip1) = context::current_branch(&vcs) else {
        bail!("HEAD must be on a branch to drop commits from it");
    };
    let (range_start, range_end) = context::parse_range_specs(&vcs, &args.range)?;
    let name = args.name.clone().unwrap_or_else(|| format!("drop-{}", &range_end[..range_end.len().min(8)]));
    let branch = args.branch.clone().or_else(|| Some(tip1.clone()));

    let mut state = revert::build_drop(
        &mut vcs,
        name,
        &tip1,
        &range_start,
        &range_end,
        args.first_parent,
        args.manual,
        branch,
    )?;
    context::maybe_set_new_default(&mut vcs, &state.name)?;

    match orchestrator::auto_complete_frontier(&mut vcs, &mut state) {
        Ok(()) => {
            eprintln!("Merge is complete!");
            Ok(0)
        }
        Err(EngineError::FrontierBlocked { i1, i2 } | EngineError::ManualMergeRequired { i1, i2 }) => {
            context::report_blocked(&mut vcs, &state, i1, i2)?;
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
