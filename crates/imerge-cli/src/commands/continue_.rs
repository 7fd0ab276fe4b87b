use anyhow::Result;
use clap::Args;
use imerge_engine::{orchestrator, EngineError};
use imerge_vcs::Vcs;

use crate::context;

#[derive(Args)]
pub struct ContinueArgs {
    /// Name of the incremental merge to continue
    #[arg(long)]
    pub name: Option<String>,

    /// Open an editor on the commit message of a staged user merge
    #[arg(long, overrides_with = "no_edit")]
    pub edit: bool,

    /// Commit a staged user merge without opening an editor
    #[arg(long, overrides_with = "edit")]
    pub no_edit: bool,
}

/// Incorporate the user's resolution of a blocked cell and resume
/// automation (§4.6). If a simple merge is still sitting staged (the user
/// ran `git add` but not `git commit`), commit it first using `MERGE_MSG`
/// as written by `manual_merge_prepare`.
pub fn run(args: &ContinueArgs) -> Result<i32> {
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

    // If there is no manual merge to incorporate (the scratch branch
    // isn't checked out), that's fine here — unlike `record`, `continue`
    // just moves on to driving the frontier forward on its own.
    let result = match orchestrator::continue_merge(&mut vcs, &mut state) {
        Err(EngineError::NoMergeInProgress) => orchestrator::auto_complete_frontier(&mut vcs, &mut state),
        other => other,
    };

    match result {
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
