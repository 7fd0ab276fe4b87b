use anyhow::Result;
use clap::Args;

use crate::context;

#[derive(Args)]
pub struct RemoveArgs {
    /// Name of the incremental merge to delete
    #[arg(long)]
    pub name: Option<String>,
}

/// Delete every ref under an incremental merge's namespace (§3's lifecycle
/// `remove` operation), discarding all recorded progress.
pub fn run(args: &RemoveArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    let name = context::choose_merge_name(&mut vcs, args.name.as_deref())?;

    imerge_engine::remove(&mut vcs, &name)?;
    if context::get_default_name(&vcs).as_deref() == Some(name.as_str()) {
        context::set_default_name(&mut vcs, None)?;
    }

    eprintln!("Removed incremental merge '{name}'.");
    Ok(0)
}
