//! Building the grid boundary for a new incremental merge (§4.10).
//!
//! Not its own component in the distilled spec — folded there into "external
//! collaborators" — but required by every entry point that creates a
//! `MergeState` (`init`, `start`, `merge`, `rebase`, `drop`, `revert`).
//! Grounded in the original Python's `Incremental.initialize`.

use imerge_grid::{Goal, GoalOpts, Grid, MergeState};
use imerge_vcs::{Oid, Vcs};

use crate::error::EngineError;

/// Resolve `tip1`/`tip2`, find their best merge base, walk both linear
/// ancestries, and populate the grid's left and top edges as
/// `SAVED_MANUAL` cells — all before any frontier computation runs, so a
/// crash between this and the first `save` still leaves a resumable merge.
pub fn discover_boundary(
    vcs: &mut dyn Vcs,
    name: String,
    tip1_spec: &str,
    tip2_spec: &str,
    first_parent: bool,
    goal: Goal,
    goalopts: GoalOpts,
    manual: bool,
    branch: Option<String>,
) -> Result<MergeState, EngineError> {
    let tip1 = vcs.commit_oid(tip1_spec)?;
    let tip2 = vcs.commit_oid(tip2_spec)?;
    build_boundary(vcs, name, tip1, tip2, first_parent, goal, goalopts, manual, branch)
}

/// The same boundary construction as [`discover_boundary`], but starting
/// from already-resolved tips. Shared with `revert::build_drop`/`build_revert`,
/// whose `tip2` is a synthetic commit with no spec of its own to resolve.
pub fn build_boundary(
    vcs: &mut dyn Vcs,
    name: String,
    tip1: Oid,
    tip2: Oid,
    first_parent: bool,
    goal: Goal,
    goalopts: GoalOpts,
    manual: bool,
    branch: Option<String>,
) -> Result<MergeState, EngineError> {
    if vcs.is_ancestor(&tip2, &tip1)? || vcs.is_ancestor(&tip1, &tip2)? {
        return Err(EngineError::NothingToDo { tip1, tip2 });
    }

    let base = vcs.merge_base_best(&tip1, &tip2)?;

    let a = vcs.linear_ancestry(&base, &tip1, first_parent)?;
    let c = vcs.linear_ancestry(&base, &tip2, first_parent)?;

    if goal == Goal::Rebase {
        for pair in c.windows(2) {
            if vcs.parents(&pair[1])?.len() > 1 {
                return Err(EngineError::RebaseRequiresLinearSecondParent);
            }
        }
    }

    let m = a.len() - 1;
    let n = c.len() - 1;
    let mut grid = Grid::new(m, n);
    for (i1, oid) in a.iter().enumerate() {
        grid.get_mut(i1, 0).record_manual(*oid);
    }
    for (i2, oid) in c.iter().enumerate() {
        grid.get_mut(0, i2).record_manual(*oid);
    }

    let branch = branch.unwrap_or_else(|| name.clone());
    let mut state = MergeState::new(name, tip1, tip2, goal, goalopts, manual, branch, grid);
    imerge_grid::persist::save(vcs, &mut state)?;
    Ok(state)
}

/// The boundary's two endpoints, for callers (like `drop`/`revert`) that
/// need the base without building a full `MergeState`.
pub fn merge_base_of(vcs: &dyn Vcs, tip1: &Oid, tip2: &Oid) -> Result<Oid, EngineError> {
    Ok(vcs.merge_base_best(tip1, tip2)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_object::{Object, Tree};
    use git_repository::Repository;
    use imerge_vcs::GitVcs;

    fn new_repo() -> (tempfile::TempDir, GitVcs) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        (dir, GitVcs::new(repo))
    }

    fn empty_tree(vcs: &mut GitVcs) -> Oid {
        vcs.repo_mut().odb().write(&Object::Tree(Tree::new())).unwrap()
    }

    fn commit(vcs: &mut GitVcs, tree: Oid, parents: &[Oid], msg: &str) -> Oid {
        vcs.commit_tree(&tree, parents, msg, None).unwrap()
    }

    #[test]
    fn rejects_when_tip2_already_reachable_from_tip1() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let base = commit(&mut vcs, tree, &[], "base");
        let tip1 = commit(&mut vcs, tree, &[base], "tip1");

        let err = build_boundary(
            &mut vcs, "t".to_string(), tip1, base, false,
            Goal::Full, GoalOpts::default(), false, None,
        ).unwrap_err();
        assert!(matches!(err, EngineError::NothingToDo { .. }));
    }

    #[test]
    fn rejects_when_tip1_already_an_ancestor_of_tip2() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let tip1 = commit(&mut vcs, tree, &[], "tip1");
        let tip2 = commit(&mut vcs, tree, &[tip1], "tip2");

        let err = build_boundary(
            &mut vcs, "t".to_string(), tip1, tip2, false,
            Goal::Full, GoalOpts::default(), false, None,
        ).unwrap_err();
        assert!(matches!(err, EngineError::NothingToDo { .. }));
    }
}
