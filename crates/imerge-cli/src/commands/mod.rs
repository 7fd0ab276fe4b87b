pub mod autofill;
pub mod continue_;
pub mod diagram;
pub mod drop_;
pub mod finish;
pub mod init;
pub mod list;
pub mod merge;
pub mod rebase;
pub mod record;
pub mod remove;
pub mod reparent;
pub mod revert;
pub mod simplify;
pub mod start;

use anyhow::Result;
use clap::Subcommand;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// List incremental merges currently in progress
    List(list::ListArgs),
    /// Initialize (but do not start automatically merging) a new incremental merge
    Init(init::InitArgs),
    /// Initialize and immediately start automatically merging
    Start(start::StartArgs),
    /// Merge another branch into the current branch incrementally
    Merge(merge::MergeArgs),
    /// Rebase the current branch onto another branch incrementally
    Rebase(rebase::RebaseArgs),
    /// Drop one or more commits from the current branch incrementally, via revert-and-rebase
    Drop(drop_::DropArgs),
    /// Revert a range of commits incrementally, recording the reverts as new commits
    Revert(revert::RevertArgs),
    /// Continue an incremental merge after manually resolving a conflict
    Continue(continue_::ContinueArgs),
    /// Record a manual merge resolution without prompting for further conflicts
    Record(record::RecordArgs),
    /// Drive the frontier forward as far as automation allows, without blocking on conflicts
    Autofill(autofill::AutofillArgs),
    /// Simplify a completed incremental merge into its final history shape
    Simplify(simplify::SimplifyArgs),
    /// Simplify a completed incremental merge and forget its temporary state
    Finish(finish::FinishArgs),
    /// Show the current state of a merge's grid
    Diagram(diagram::DiagramArgs),
    /// Delete all trace of an incremental merge
    Remove(remove::RemoveArgs),
    /// Rebuild a commit (and its descendants) with different parents
    Reparent(reparent::ReparentArgs),
}

pub fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::List(args) => list::run(args),
        Commands::Init(args) => init::run(args),
        Commands::Start(args) => start::run(args),
        Commands::Merge(args) => merge::run(args),
        Commands::Rebase(args) => rebase::run(args),
        Commands::Drop(args) => drop_::run(args),
        Commands::Revert(args) => revert::run(args),
        Commands::Continue(args) => continue_::run(args),
        Commands::Record(args) => record::run(args),
        Commands::Autofill(args) => autofill::run(args),
        Commands::Simplify(args) => simplify::run(args),
        Commands::Finish(args) => finish::run(args),
        Commands::Diagram(args) => diagram::run(args),
        Commands::Remove(args) => remove::run(args),
        Commands::Reparent(args) => reparent::run(args),
    }
}
