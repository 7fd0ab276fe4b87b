use anyhow::{bail, Result};
use clap::Args;
use imerge_engine::{orchestrator, EngineError};
use imerge_grid::{Goal, GoalOpts};

use crate::context;

#[derive(Args)]
pub struct RebaseArgs {
    /// Name of the incremental merge to create (default: the current branch)
    #[arg(long)]
    pub name: Option<String>,

    /// The type of simplification the merge should eventually produce
    #[arg(long, default_value = "rebase")]
    pub goal: String,

    /// Name of the branch to which the result will eventually be stored
    #[arg(long)]
    pub branch: Option<String>,

    /// Require every manual merge, disabling bisection
    #[arg(long)]
    pub manual: bool,

    #[arg(long = "first-parent", hide = true, default_value_t = true)]
    pub first_parent: bool,

    /// The tip of the branch onto which the current branch should be rebased
    pub tip1: String,
}

/// Start a simple rebase of HEAD onto `tip1` via incremental merge.
pub fn run(args: &RebaseArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    vcs.require_clean_worktree()?;

    let Some(goal) = Goal::parse(&args.goal) else {
        bail!("unknown goal '{}'", args.goal);
    };
    let current = context::current_branch(&vcs);
    let branch = args.branch.clone().or_else(|| current.clone());
    let name = match &args.name {
        Some(name) => name.clone(),
        None => current.clone().ok_or_else(|| {
            anyhow::anyhow!("the checked-out branch could not be used as the imerge name; please use --name")
        })?,
    };
    let tip2 = vcs.resolve("HEAD")?.to_string();

    let mut state = match imerge_engine::boundary::discover_boundary(
        &mut vcs,
        name,
        &args.tip1,
        &tip2,
        args.first_parent,
        goal,
        GoalOpts::default(),
        args.manual,
        branch,
    ) {
        Ok(state) => state,
        Err(EngineError::NothingToDo { .. }) => {
            println!("Already up-to-date.");
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };
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
