use anyhow::Result;
use clap::Args;
use imerge_engine::simplify;

use crate::context;

#[derive(Args)]
pub struct FinishArgs {
    /// Name of the incremental merge to finish
    #[arg(long)]
    pub name: Option<String>,

    /// Update the target branch even if it is not a fast-forward
    #[arg(long)]
    pub force: bool,
}

/// `simplify`, then forget the incremental merge's temporary state (§4.8):
/// the simplified history is the durable result, so there's no reason to
/// keep the scratch grid's refs around once it's been written out.
pub fn run(args: &FinishArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    let name = context::choose_merge_name(&mut vcs, args.name.as_deref())?;
    let state = imerge_engine::load(&vcs, &name)?;

    let refname = format!("refs/heads/{}", state.branch);
    let commit = simplify::simplify(&mut vcs, &state, &refname, args.force)?;
    imerge_engine::remove(&mut vcs, &name)?;
    if context::get_default_name(&vcs).as_deref() == Some(name.as_str()) {
        context::set_default_name(&mut vcs, None)?;
    }

    eprintln!("Finished '{}': {} is now {}", name, state.branch, commit);
    Ok(0)
}
