mod commands;
mod context;
mod diagram;

use std::process;

use anyhow::Result;
use clap::Parser;

use commands::Commands;

#[derive(Parser)]
#[command(name = "imerge", about = "Incremental, bisected merging of one branch into another")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    // Set for the duration of the run so any hook scripts the repository
    // owner has installed can detect they're running under imerge.
    std::env::set_var("GIT_IMERGE", "1");

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("imerge: fatal: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    commands::run(cli)
}
