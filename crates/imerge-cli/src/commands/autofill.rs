use anyhow::Result;
use clap::Args;
use imerge_engine::{orchestrator, EngineError};

use crate::context;

#[derive(Args)]
pub struct AutofillArgs {
    /// Name of the incremental merge to drive forward
    #[arg(long)]
    pub name: Option<String>,
}

/// Drive the frontier forward as far as automation allows without
/// requesting a user merge first — equivalent to `continue`'s
/// auto-expansion loop, minus the part that reconciles a conflict
/// resolution from the scratch branch.
pub fn run(args: &AutofillArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    let name = context::choose_merge_name(&mut vcs, args.name.as_deref())?;
    let mut state = imerge_engine::load(&vcs, &name)?;

    match orchestrator::auto_complete_frontier(&mut vcs, &mut state) {
        Ok(()) => {
            eprintln!("Merge is complete!");
            Ok(0)
        }
        Err(EngineError::FrontierBlocked { i1, i2 } | EngineError::ManualMergeRequired { i1, i2 }) => {
            eprintln!("Automation stalled at {i1}-{i2}; a manual merge is required there.");
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
