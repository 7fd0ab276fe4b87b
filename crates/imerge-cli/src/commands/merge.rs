use anyhow::Result;
use clap::Args;
use imerge_engine::{orchestrator, EngineError};
use imerge_grid::{Goal, GoalOpts};

use crate::context;

#[derive(Args)]
pub struct MergeArgs {
    /// Name of the incremental merge to create (default: the branch being merged)
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

    #[arg(long = "first-parent", hide = true, default_value_t = true)]
    pub first_parent: bool,

    /// The tip of the branch to be merged into HEAD
    pub tip2: String,
}

/// Start a simple merge of `tip2` into HEAD via incremental merge.
pub fn run(args: &MergeArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    vcs.require_clean_worktree()?;

    let Some(goal) = Goal::parse(&args.goal) else {
        anyhow::bail!("unknown goal '{}'", args.goal);
    };
    let tip1 = context::current_branch(&vcs);
    let name = args.name.clone().unwrap_or_else(|| args.tip2.clone());
    let branch = args.branch.clone().or_else(|| tip1.clone());
    let tip1_spec = tip1.unwrap_or_else(|| "HEAD".to_string());

    let mut state = match imerge_engine::boundary::discover_boundary(
        &mut vcs,
        name,
        &tip1_spec,
        &args.tip2,
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
