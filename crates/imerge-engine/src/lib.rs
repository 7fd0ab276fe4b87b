//! Orchestration layer: building a merge's boundary, driving its frontier to
//! completion, and simplifying the result into conventional history (§4).
//!
//! Nothing here talks to the user directly — every operation returns a typed
//! [`error::EngineError`] and leaves message formatting, confirmation
//! prompts, and exit codes to the CLI that drives it.

pub mod boundary;
pub mod error;
pub mod orchestrator;
pub mod revert;
pub mod simplify;

pub use error::EngineError;

use imerge_grid::persist;
use imerge_vcs::Vcs;

/// The namespace prefix every imerge state ref lives under.
const NAMESPACE_PREFIX: &str = "refs/imerge/";

/// Every imerge name that currently has a saved state blob, sorted
/// alphabetically (`for_each_ref` already returns refs in that order).
/// Grounded in the original Python's `iter_existing_imerge_names`: scan
/// `refs/imerge/*/state` and strip the namespace wrapper off each name.
pub fn list_merges(vcs: &dyn Vcs) -> Result<Vec<String>, EngineError> {
    let mut names = Vec::new();
    for (refname, _oid) in vcs.for_each_ref(NAMESPACE_PREFIX)? {
        let Some(rest) = refname.strip_prefix(NAMESPACE_PREFIX) else { continue };
        let Some(name) = rest.strip_suffix("/state") else { continue };
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    names.sort();
    names.dedup();
    Ok(names)
}

/// Load a previously-saved merge by name.
pub fn load(vcs: &dyn Vcs, name: &str) -> Result<imerge_grid::MergeState, EngineError> {
    Ok(persist::read(vcs, name)?)
}

/// Delete every ref under a merge's namespace (§6's `remove` subcommand).
pub fn remove(vcs: &mut dyn Vcs, name: &str) -> Result<(), EngineError> {
    Ok(persist::remove(vcs, name)?)
}
