use anyhow::Result;
use clap::Args;
use imerge_engine::simplify;

use crate::context;

#[derive(Args)]
pub struct SimplifyArgs {
    /// Name of the incremental merge to simplify
    #[arg(long)]
    pub name: Option<String>,

    /// Update the target branch even if it is not a fast-forward
    #[arg(long)]
    pub force: bool,
}

/// Collapse a completed grid into its goal's conventional history shape and
/// write the result to the merge's target branch (§4.8).
pub fn run(args: &SimplifyArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    let name = context::choose_merge_name(&mut vcs, args.name.as_deref())?;
    let state = imerge_engine::load(&vcs, &name)?;

    let refname = format!("refs/heads/{}", state.branch);
    let commit = simplify::simplify(&mut vcs, &state, &refname, args.force)?;

    eprintln!("Simplified '{}' to {} on {}", name, commit, refname);
    Ok(0)
}
