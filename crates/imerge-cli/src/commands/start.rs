use anyhow::{bail, Result};
use clap::Args;
use imerge_engine::{orchestrator, EngineError};
use imerge_grid::{Goal, GoalOpts};

use crate::context;

#[derive(Args)]
pub struct StartArgs {
    /// Name of the incremental merge to create
    #[arg(long)]
    pub name: Option<String>,

    /// The type of simplification the merge should eventually produce
    #[arg(long, default_value = "merge")]
    pub goal: String,

    /// Name of the branch to which the result will eventually be stored
    #[arg(long)]
    pub branch: Option<String>,

    /// Require every manual merge, disabling bisection
    #[arg(long)]
    pub manual: bool,

    /// Handle only first-parent ancestry (required for nonlinear history)
    #[arg(long = "first-parent")]
    pub first_parent: bool,

    /// The tip of the branch to be merged into HEAD
    pub tip2: String,
}

/// Equivalent to `init` followed immediately by `continue`'s auto-fill step.
pub fn run(args: &StartArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    vcs.require_clean_worktree()?;

    let Some(name) = &args.name else {
        bail!("please specify the --name to be used for this incremental merge");
    };
    let Some(goal) = Goal::parse(&args.goal) else {
        bail!("unknown goal '{}'", args.goal);
    };
    let tip1 = context::current_branch(&vcs).unwrap_or_else(|| "HEAD".to_string());

    let mut state = imerge_engine::boundary::discover_boundary(
        &mut vcs,
        name.clone(),
        &tip1,
        &args.tip2,
        args.first_parent,
        goal,
        GoalOpts::default(),
        args.manual,
        args.branch.clone(),
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
