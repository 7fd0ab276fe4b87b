//! Driving a `MergeState` forward: automatic frontier expansion, the
//! scratch-branch handoff to the user when automation hits a conflict, and
//! reconciling the user's resolution on `continue` (§4.6/§4.7/§5).

use imerge_frontier::{FrontierError, MergeFrontier};
use imerge_grid::{persist, MergeState};
use imerge_vcs::{HeadGuard, Vcs};

use crate::error::EngineError;

fn scratch_ref(name: &str) -> String {
    format!("refs/heads/imerge/{name}")
}

/// Repeatedly compute the frontier and expand it until the whole grid is
/// known (`Ok(())`), or a conflict blocks further progress
/// (`FrontierBlocked`). The state is saved after every call to
/// `auto_expand`, whether it succeeded or failed, so a blocked merge is
/// resumable without redoing work.
pub fn auto_complete_frontier(vcs: &mut dyn Vcs, state: &mut MergeState) -> Result<(), EngineError> {
    loop {
        let mut frontier = MergeFrontier::map_known_frontier(&state.grid, state.manual);
        match frontier.auto_expand(vcs, &mut state.grid, &state.name) {
            Ok(()) => {
                persist::save(vcs, state)?;
                return Ok(());
            }
            Err(FrontierError::BlockComplete) => {
                persist::save(vcs, state)?;
                return Ok(());
            }
            Err(FrontierError::FrontierBlocked { i1, i2 }) => {
                persist::save(vcs, state)?;
                return Err(if state.manual {
                    EngineError::ManualMergeRequired { i1, i2 }
                } else {
                    EngineError::FrontierBlocked { i1, i2 }
                });
            }
            Err(FrontierError::UnexpectedMergeFailure { i1, i2 }) => {
                persist::save(vcs, state)?;
                return Err(EngineError::FrontierBlocked { i1, i2 });
            }
            Err(e @ FrontierError::InconsistentVertex { .. }) => {
                persist::save(vcs, state)?;
                return Err(e.into());
            }
            Err(FrontierError::Vcs(e)) => return Err(e.into()),
        }
    }
}

/// Set up the scratch branch for a manual merge of the blocker at
/// `(bi1, bi2)` and hand the worktree to the user (§4.6 step 1-3): the
/// scratch ref is pointed at `M[bi1,bi2-1]`, checked out, and a conflicted
/// merge of `M[bi1-1,bi2]` is prepared on top of it.
pub fn start_manual_merge(
    vcs: &mut dyn Vcs,
    state: &MergeState,
    bi1: usize,
    bi2: usize,
) -> Result<(), EngineError> {
    let left = state
        .grid
        .get(bi1, bi2 - 1)
        .sha1
        .expect("blocker's left neighbor is always known");
    let above = state
        .grid
        .get(bi1 - 1, bi2)
        .sha1
        .expect("blocker's top neighbor is always known");

    let refname = scratch_ref(&state.name);
    vcs.update_ref(&refname, left, "imerge: begin manual merge")?;
    vcs.checkout(&refname, true)?;
    let msg = format!("imerge '{}': manual merge {}-{}", state.name, bi1, bi2);
    vcs.manual_merge_prepare(&above, &left, &msg)?;
    Ok(())
}

/// Validate that `commit` is usable as the resolution of a currently
/// blocked cell (its parents are exactly two adjacent known grid cells),
/// record it there as `NEW_MANUAL`, and save. Shared by `continue` (which
/// additionally tears down the scratch branch) and `record` (which accepts
/// an arbitrary already-made commit without requiring one).
pub fn record_resolution(vcs: &mut dyn Vcs, state: &mut MergeState, commit: imerge_vcs::Oid) -> Result<(), EngineError> {
    let parents = vcs.parents(&commit)?;
    if parents.len() != 2 {
        return Err(EngineError::ManualMergeUnusable {
            reason: format!("commit has {} parents, expected 2", parents.len()),
        });
    }

    let mut located: Vec<(usize, usize)> = Vec::with_capacity(2);
    for parent in &parents {
        match state.grid.find_index(parent) {
            Some(coords) => located.push(coords),
            None => {
                return Err(EngineError::ManualMergeUnusable {
                    reason: format!("parent {parent} is not a known grid cell"),
                })
            }
        }
    }
    located.sort();
    let above = located[0];
    let left = located[1];
    if above.0 + 1 != left.0 || above.1 != left.1 + 1 {
        return Err(EngineError::ManualMergeUnusable {
            reason: format!(
                "parents at {above:?} and {left:?} are not the top and left neighbors of a grid vertex"
            ),
        });
    }
    let (i1, i2) = locate_vertex(above, left);

    state.grid.get_mut(i1, i2).record_manual(commit);
    persist::save(vcs, state)?;
    Ok(())
}

/// Reconcile the user's resolution of a manual merge (§4.6's `continue`):
/// locate HEAD's two parents in the grid, require that they are adjacent
/// cells, record the merge, and resume automatic expansion.
pub fn continue_merge(vcs: &mut dyn Vcs, state: &mut MergeState) -> Result<(), EngineError> {
    let refname = scratch_ref(&state.name);
    match vcs.head_state()? {
        imerge_vcs::HeadState::Symbolic(branch) if branch == refname => {}
        _ => return Err(EngineError::NoMergeInProgress),
    }

    let head = vcs.resolve("HEAD")?;
    record_resolution(vcs, state, head)?;

    let guard = HeadGuard::acquire(vcs)?;
    vcs.detach_head()?;
    vcs.delete_ref(&refname)?;
    guard.release(vcs)?;

    auto_complete_frontier(vcs, state)
}

/// Given the grid coordinates of a manual merge's two parents (one directly
/// above the vertex at `(i1-1, i2)`, one directly to its left at
/// `(i1, i2-1)`), return the vertex `(i1, i2)` itself.
fn locate_vertex(above: (usize, usize), left: (usize, usize)) -> (usize, usize) {
    debug_assert_eq!(above.0 + 1, left.0);
    debug_assert_eq!(left.1 + 1, above.1);
    (left.0, above.1)
}
