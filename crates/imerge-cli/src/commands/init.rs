use anyhow::{bail, Result};
use clap::Args;
use imerge_grid::{Goal, GoalOpts};

use crate::context;

#[derive(Args)]
pub struct InitArgs {
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

pub fn run(args: &InitArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    vcs.require_clean_worktree()?;

    let Some(name) = &args.name else {
        bail!("please specify the --name to be used for this incremental merge");
    };
    let Some(goal) = Goal::parse(&args.goal) else {
        bail!("unknown goal '{}'", args.goal);
    };
    let tip1 = context::current_branch(&vcs).unwrap_or_else(|| "HEAD".to_string());

    let state = imerge_engine::boundary::discover_boundary(
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

    println!(
        "Initialized incremental merge '{}' between '{}' and '{}'",
        state.name, tip1, args.tip2
    );
    println!("Run 'imerge start --name={}' to begin merging", state.name);
    Ok(0)
}
