use anyhow::Result;
use clap::Args;

use crate::context;

#[derive(Args)]
pub struct ListArgs {}

/// Print every imerge name, one per line, marking the default with `*`.
pub fn run(_args: &ListArgs) -> Result<i32> {
    let vcs = context::open_vcs()?;
    let names = imerge_engine::list_merges(&vcs)?;
    if names.is_empty() {
        println!("No incremental merges in progress.");
        return Ok(0);
    }
    let default = context::get_default_name(&vcs);
    for name in &names {
        let marker = if Some(name) == default.as_ref() { "*" } else { " " };
        println!("{marker} {name}");
    }
    Ok(0)
}
