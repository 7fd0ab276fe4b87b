use anyhow::Result;
use clap::Args;
use imerge_vcs::Vcs;

use crate::context;

#[derive(Args)]
pub struct ReparentArgs {
    /// The commit to rebuild with new parents
    pub start: String,

    /// The new parents to give `start` (at least one)
    #[arg(required = true)]
    pub parents: Vec<String>,

    /// A descendant of `start` whose whole ancestry path should be rebuilt
    /// on top of the replacement (default: `start` itself, a single commit)
    #[arg(long)]
    pub end: Option<String>,
}

/// Rebuild a commit with different parents, propagating the change along
/// its ancestry path up to a descendant tip (§4.9).
pub fn run(args: &ReparentArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    vcs.require_clean_worktree()?;

    let start = vcs.commit_oid(&args.start)?;
    let new_parents: Result<Vec<_>, _> = args.parents.iter().map(|p| vcs.commit_oid(p)).collect();
    let new_parents = new_parents?;
    let end = match &args.end {
        Some(spec) => vcs.commit_oid(spec)?,
        None => start,
    };

    let replacement = imerge_reparent::reparent_chain(&mut vcs, &start, &new_parents, &end)?;
    println!("{replacement}");
    Ok(0)
}
