use anyhow::Result;
use clap::Args;
use imerge_engine::{orchestrator, EngineError};
use imerge_vcs::Vcs;

use crate::context;

#[derive(Args)]
pub struct RecordArgs {
    /// Name of the incremental merge to record against
    #[arg(long)]
    pub name: Option<String>,

    /// Open an editor on the commit message of a staged user merge
    #[arg(long, overrides_with = "no_edit")]
    pub edit: bool,

    /// Commit a staged user merge without opening an editor
    #[arg(long, overrides_with = "edit")]
    pub no_edit: bool,
}

/// Incorporate the scratch branch's merge the same way `continue` does, but
/// fail outright if there is nothing to incorporate, and don't set up the
/// next manual merge if the frontier stalls again right away — useful when
/// the caller just wants this one resolution filed away (§4.6).
pub fn run(args: &RecordArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    let name = context::choose_merge_name(&mut vcs, args.name.as_deref())?;
    let mut state = imerge_engine::load(&vcs, &name)?;

    let edit = if args.edit {
        true
    } else if args.no_edit {
        false
    } else {
        context::default_edit(&vcs)
    };
    if vcs.commit_pending_merge(edit)?.is_none() {
        vcs.require_clean_worktree()?;
    }

    match orchestrator::continue_merge(&mut vcs, &mut state) {
        Ok(()) => eprintln!("Merge is complete!"),
        Err(EngineError::FrontierBlocked { .. } | EngineError::ManualMergeRequired { .. }) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(0)
}
