//! Synthetic boundaries for the `drop` and `revert` goals (§4.11).
//!
//! Neither goal merges two independent tips: both work on a single ancestry,
//! dropping or reverting a contiguous range of commits out of it. The trick,
//! grounded in the original Python's `cmd_drop`/`cmd_revert`, is to build a
//! *synthetic* `tip2` — a chain of revert commits undoing the range in
//! reverse order — and then run the ordinary two-tip boundary discovery
//! against `tip1` and that synthetic tip. The rest of the machinery (frontier
//! expansion, simplification) never needs to know the merge wasn't a "real"
//! one.

use imerge_grid::{Goal, GoalOpts, MergeState};
use imerge_vcs::{Oid, Vcs};

use crate::boundary::build_boundary;
use crate::error::EngineError;

/// Build a commit that is `range_end`'s tree with every commit in
/// `(range_start, range_end]` reverted out of it, one revert per commit,
/// applied oldest-last (i.e. the most recent commit in the range is
/// reverted first, since each revert must apply on top of the previous
/// revert's result).
///
/// `range_start` is excluded from the commits being dropped — it is the
/// commit the range is dropped *back to* — matching the original's
/// "drop commits after `range_start` up to and including `range_end`"
/// framing. This crate's `Vcs::linear_ancestry` includes both endpoints, so
/// the start is sliced off here.
fn synthetic_revert_tip2(
    vcs: &mut dyn Vcs,
    range_start: &Oid,
    range_end: &Oid,
    first_parent: bool,
) -> Result<Oid, EngineError> {
    let ancestry = vcs.linear_ancestry(range_start, range_end, first_parent)?;
    let to_drop = &ancestry[1..];

    let mut onto = *range_end;
    for target in to_drop.iter().rev() {
        onto = vcs.revert_commit(&onto, target)?;
    }
    Ok(onto)
}

/// Build the boundary for a `drop` merge: the commits in
/// `(range_start, range_end]` disappear entirely from the simplified
/// history, reattaching whatever follows `range_end` directly onto
/// `range_start`.
#[allow(clippy::too_many_arguments)]
pub fn build_drop(
    vcs: &mut dyn Vcs,
    name: String,
    tip1_spec: &str,
    range_start_spec: &str,
    range_end_spec: &str,
    first_parent: bool,
    manual: bool,
    branch: Option<String>,
) -> Result<MergeState, EngineError> {
    let tip1 = vcs.commit_oid(tip1_spec)?;
    let range_start = vcs.commit_oid(range_start_spec)?;
    let range_end = vcs.commit_oid(range_end_spec)?;

    let tip2 = synthetic_revert_tip2(vcs, &range_start, &range_end, first_parent)?;
    let goalopts = GoalOpts { base: Some(range_start) };

    build_boundary(vcs, name, tip1, tip2, first_parent, Goal::Drop, goalopts, manual, branch)
}

/// Build the boundary for a `revert` merge: the commits in
/// `(range_start, range_end]` are undone by new commits appended on top,
/// rather than erased from history.
#[allow(clippy::too_many_arguments)]
pub fn build_revert(
    vcs: &mut dyn Vcs,
    name: String,
    tip1_spec: &str,
    range_start_spec: &str,
    range_end_spec: &str,
    first_parent: bool,
    manual: bool,
    branch: Option<String>,
) -> Result<MergeState, EngineError> {
    let tip1 = vcs.commit_oid(tip1_spec)?;
    let range_start = vcs.commit_oid(range_start_spec)?;
    let range_end = vcs.commit_oid(range_end_spec)?;

    let tip2 = synthetic_revert_tip2(vcs, &range_start, &range_end, first_parent)?;

    build_boundary(
        vcs,
        name,
        tip1,
        tip2,
        first_parent,
        Goal::Revert,
        GoalOpts::default(),
        manual,
        branch,
    )
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

    fn commit_chain(vcs: &mut GitVcs, n: usize) -> Vec<Oid> {
        let tree = empty_tree(vcs);
        let mut chain = Vec::with_capacity(n);
        let mut parents = Vec::new();
        for i in 0..n {
            let oid = vcs.commit_tree(&tree, &parents, &format!("commit {i}"), None).unwrap();
            parents = vec![oid];
            chain.push(oid);
        }
        chain
    }

    #[test]
    fn synthetic_tip2_reverts_single_commit_over_itself() {
        let (_dir, mut vcs) = new_repo();
        let chain = commit_chain(&mut vcs, 2);
        let start = chain[0];
        let end = chain[1];

        let tip2 = synthetic_revert_tip2(&mut vcs, &start, &end, true).unwrap();
        assert_ne!(tip2, end);
        let parents = vcs.parents(&tip2).unwrap();
        assert_eq!(parents, vec![end]);
    }

    #[test]
    fn synthetic_tip2_reverts_a_range_most_recent_first() {
        let (_dir, mut vcs) = new_repo();
        let chain = commit_chain(&mut vcs, 4);
        let start = chain[0];
        let end = chain[3];

        let tip2 = synthetic_revert_tip2(&mut vcs, &start, &end, true).unwrap();
        // Three reverts stacked on top of `end`, one per dropped commit.
        let first_revert_parents = vcs.parents(&tip2).unwrap();
        assert_eq!(first_revert_parents, vec![end]);
    }

    #[test]
    fn build_drop_records_goalopts_base() {
        let (_dir, mut vcs) = new_repo();
        let chain = commit_chain(&mut vcs, 3);
        let tip1 = chain[0];
        let start = chain[0];
        let end = chain[2];

        let tip1_ref = tip1.to_hex().to_string();
        let start_ref = start.to_hex().to_string();
        let end_ref = end.to_hex().to_string();

        let state = build_drop(
            &mut vcs,
            "drop-test".to_string(),
            &tip1_ref,
            &start_ref,
            &end_ref,
            true,
            false,
            None,
        )
        .unwrap();

        assert_eq!(state.goal, Goal::Drop);
        assert_eq!(state.goalopts.base, Some(start));
    }
}
