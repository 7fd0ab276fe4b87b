use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::context;
use crate::diagram as render;

#[derive(Args)]
pub struct DiagramArgs {
    /// Name of the incremental merge to show
    #[arg(long)]
    pub name: Option<String>,

    /// Write an HTML table to this path instead of printing ASCII to stdout
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Force-disable ANSI colors even on a terminal
    #[arg(long)]
    pub no_color: bool,
}

pub fn run(args: &DiagramArgs) -> Result<i32> {
    let mut vcs = context::open_vcs()?;
    let name = context::choose_merge_name(&mut vcs, args.name.as_deref())?;
    let state = imerge_engine::load(&vcs, &name)?;

    if let Some(path) = &args.html {
        fs::write(path, render::render_html(&name, &state))?;
        eprintln!("Wrote diagram to {}", path.display());
        return Ok(0);
    }

    let color = !args.no_color;
    print!("{}", render::render_ascii(&state, color));
    print!("{}", render::legend(color));
    Ok(0)
}
