//! Collapsing a complete grid down into the conventional history shape its
//! goal names (§4.8): a single fast-forward commit, a rebase, a rebase that
//! keeps every original commit's message, a two-sided border merge, a merge
//! commit, or a drop/revert chain. Grounded in the original Python's
//! `simplify_to_*` family and `_set_refname`.

use bstr::{ByteSlice, ByteVec};
use git_utils::bstring::GitBStringExt;
use imerge_grid::{Goal, MergeState};
use imerge_vcs::{Oid, Vcs};

use crate::error::EngineError;

/// Point `refname` (e.g. `refs/heads/foo`) at `commit`, fast-forwarding it if
/// it already exists (unless `force`), and leave it checked out.
///
/// If HEAD is currently a symbolic ref to `refname`, the update is done with
/// `reset_hard` so the worktree follows along; otherwise the ref is updated
/// directly and then checked out.
///
/// The ordinary fast-forward test is "is the branch's current tip an
/// ancestor of the new commit". For `drop`/`revert`, that test is
/// backwards: the whole point of the goal is to produce a commit that is
/// *not* a descendant of the tip it replaces (the dropped/reverted range is
/// deliberately missing from its ancestry). `ff_target`, when given,
/// overrides what the branch's current tip is checked against — callers
/// pass the grid's pre-simplification apex (the full, un-dropped merge
/// result) instead of the freshly built `commit`, so the check still reads
/// "has the branch moved past what imerge already accounted for", just
/// against the apex rather than the synthetic drop/revert chain.
pub fn set_refname(vcs: &mut dyn Vcs, refname: &str, commit: Oid, force: bool) -> Result<(), EngineError> {
    set_refname_checked(vcs, refname, commit, force, None)
}

fn set_refname_checked(
    vcs: &mut dyn Vcs,
    refname: &str,
    commit: Oid,
    force: bool,
    ff_target: Option<Oid>,
) -> Result<(), EngineError> {
    match vcs.read_ref(refname)? {
        None => {
            vcs.update_ref(refname, commit, "imerge: recording final merge")?;
            vcs.checkout(refname, true)?;
        }
        Some(old) => {
            if !force {
                let target = ff_target.unwrap_or(commit);
                if !vcs.is_ancestor(&old, &target)? {
                    return Err(EngineError::NotFastForward { branch: refname.to_string() });
                }
            }
            match vcs.head_state()? {
                imerge_vcs::HeadState::Symbolic(branch) if branch == refname => {
                    vcs.reset_hard(&commit)?;
                }
                _ => {
                    vcs.update_ref(refname, commit, "imerge: recording final merge")?;
                    vcs.checkout(refname, true)?;
                }
            }
        }
    }
    Ok(())
}

/// Build a chain of commits along `path`, one per `(commit, metadata)` pair:
/// each commit's tree comes from `commit`, its message and author from
/// `metadata`. `base` (or none, for a root commit) parents the first entry.
///
/// Reuses existing commits from `path` verbatim for as long as each
/// `commit == metadata` and its actual parents already match what this
/// function would have built — the same commit object is simply adopted as
/// the new chain link instead of creating a redundant copy. The first
/// mismatch ends reuse permanently; every following link is freshly created
/// even if it too would technically qualify.
pub fn create_commit_chain(
    vcs: &mut dyn Vcs,
    base: Option<Oid>,
    path: &[(Oid, Oid)],
) -> Result<Oid, EngineError> {
    let mut parents: Vec<Oid> = match base {
        Some(oid) => vec![oid],
        None => Vec::new(),
    };
    let mut reusing = true;

    for &(commit, metadata) in path {
        if reusing {
            if commit == metadata && vcs.parents(&commit)? == parents {
                parents = vec![commit];
                continue;
            }
            reusing = false;
        }

        let tree = vcs.get_tree(&commit)?;
        let msg = vcs.log_message(&metadata)?;
        let author = vcs.author_triplet(&metadata)?;
        let new_commit = vcs.commit_tree(&tree, &parents, msg.to_str_lossy().as_ref(), Some(&author))?;
        parents = vec![new_commit];
    }

    match parents.len() {
        1 => Ok(parents[0]),
        _ => unreachable!("create_commit_chain requires a base or a non-empty path"),
    }
}

fn rebased_message(vcs: &dyn Vcs, orig: &Oid, with_history: bool) -> Result<(bstr::BString, imerge_vcs::AuthorTriplet), EngineError> {
    let original = vcs.log_message(orig)?;
    let note = if with_history {
        format!("\n\n(rebased-with-history from commit {orig})\n")
    } else {
        format!("\n\n(rebased from commit {orig})\n")
    };
    let mut msg = original.rtrim_newlines().to_owned();
    msg.push_str(note.as_bytes());
    Ok((msg, vcs.author_triplet(orig)?))
}

/// `rebase`/`revert`: the commits along the left edge (`tip1`'s own history)
/// stay, and every commit `M[0,i2]` on the boundary of `tip2`'s side is
/// replayed on top, reusing `M[m,i2]`'s tree wherever an already-built
/// rebase commit can be adopted unchanged.
fn simplify_to_rebase(vcs: &mut dyn Vcs, state: &MergeState) -> Result<Oid, EngineError> {
    let m = state.grid.m();
    let n = state.grid.n();
    let mut path = Vec::with_capacity(n);
    for i2 in 1..=n {
        let commit = state.grid.get(m, i2).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let metadata = state.grid.get(0, i2).sha1.ok_or(EngineError::FrontierIncomplete)?;
        path.push((commit, metadata));
    }
    let base = state.grid.get(m, 0).sha1.ok_or(EngineError::FrontierIncomplete)?;
    create_commit_chain(vcs, Some(base), &path)
}

/// `rebase-with-history`: like `rebase`, but every replayed commit keeps a
/// two-parent link back to the original it replaced, and no reuse is
/// attempted (the chain's whole point is to carry history forward, not to
/// collapse back into previously-built commits).
fn simplify_to_rebase_with_history(vcs: &mut dyn Vcs, state: &MergeState) -> Result<Oid, EngineError> {
    let m = state.grid.m();
    let n = state.grid.n();
    let mut commit = state.grid.get(m, 0).sha1.ok_or(EngineError::FrontierIncomplete)?;
    for i2 in 1..=n {
        let orig = state.grid.get(0, i2).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let vertex = state.grid.get(m, i2).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let tree = vcs.get_tree(&vertex)?;
        let (msg, author) = rebased_message(vcs, &orig, true)?;
        commit = vcs.commit_tree(&tree, &[commit, orig], msg.to_str_lossy().as_ref(), Some(&author))?;
    }
    Ok(commit)
}

/// `border`/`border-with-history`/`border-with-history2`: two independent
/// chains, one along each outer edge, joined by a final merge commit whose
/// tree is the grid's apex.
fn simplify_to_border(
    vcs: &mut dyn Vcs,
    state: &MergeState,
    with_history1: bool,
    with_history2: bool,
) -> Result<Oid, EngineError> {
    let m = state.grid.m();
    let n = state.grid.n();

    let mut commit1 = state.grid.get(m, 0).sha1.ok_or(EngineError::FrontierIncomplete)?;
    for i2 in 1..n {
        let orig = state.grid.get(0, i2).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let vertex = state.grid.get(m, i2).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let tree = vcs.get_tree(&vertex)?;
        let (msg, author) = rebased_message(vcs, &orig, with_history2)?;
        let parents = if with_history2 { vec![commit1, orig] } else { vec![commit1] };
        commit1 = vcs.commit_tree(&tree, &parents, msg.to_str_lossy().as_ref(), Some(&author))?;
    }

    let mut commit2 = state.grid.get(0, n).sha1.ok_or(EngineError::FrontierIncomplete)?;
    for i1 in 1..m {
        let orig = state.grid.get(i1, 0).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let vertex = state.grid.get(i1, n).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let tree = vcs.get_tree(&vertex)?;
        let (msg, author) = rebased_message(vcs, &orig, with_history1)?;
        let parents = if with_history1 { vec![orig, commit2] } else { vec![commit2] };
        commit2 = vcs.commit_tree(&tree, &parents, msg.to_str_lossy().as_ref(), Some(&author))?;
    }

    let apex_tree = vcs.get_tree(&state.grid.apex().sha1.ok_or(EngineError::FrontierIncomplete)?)?;
    let msg = format!("Merge {} into {} (using imerge border)", state.tip2, state.tip1);
    vcs.commit_tree(&apex_tree, &[commit1, commit2], &msg, None).map_err(Into::into)
}

/// `drop`: walks the bottom row in reverse axis (by `i1` rather than `i2`),
/// since what's being preserved is `tip1`'s own history with a range of its
/// commits removed, parented onto `goalopts.base` instead of the usual
/// `M[m,0]`.
fn simplify_to_drop(vcs: &mut dyn Vcs, state: &MergeState) -> Result<Oid, EngineError> {
    let base = state.goalopts.base.ok_or(EngineError::DropGoalMissingBase)?;
    let m = state.grid.m();
    let n = state.grid.n();
    let mut path = Vec::with_capacity(m);
    for i1 in 1..=m {
        let commit = state.grid.get(i1, n).sha1.ok_or(EngineError::FrontierIncomplete)?;
        let metadata = state.grid.get(i1, 0).sha1.ok_or(EngineError::FrontierIncomplete)?;
        path.push((commit, metadata));
    }
    create_commit_chain(vcs, Some(base), &path)
}

/// `merge`: a single two-parent commit with a generic message, left for the
/// caller (the CLI, which owns message-editing) to amend interactively if it
/// wants a more specific summary.
fn simplify_to_merge(vcs: &mut dyn Vcs, state: &MergeState) -> Result<Oid, EngineError> {
    let apex = state.grid.apex().sha1.ok_or(EngineError::FrontierIncomplete)?;
    let tree = vcs.get_tree(&apex)?;
    let p1 = state.grid.get(state.grid.m(), 0).sha1.ok_or(EngineError::FrontierIncomplete)?;
    let p2 = state.grid.get(0, state.grid.n()).sha1.ok_or(EngineError::FrontierIncomplete)?;
    let msg = format!("Merge {} into {} (using imerge)", state.tip2, state.tip1);
    Ok(vcs.commit_tree(&tree, &[p1, p2], &msg, None)?)
}

/// Collapse `state`'s grid into its goal's shape and point `refname` at the
/// result (§4.8). The grid must be complete (every cell known); callers are
/// expected to have already run `auto_complete_frontier` to completion.
pub fn simplify(vcs: &mut dyn Vcs, state: &MergeState, refname: &str, force: bool) -> Result<Oid, EngineError> {
    if !state.grid.is_known(state.grid.m(), state.grid.n()) {
        return Err(EngineError::FrontierIncomplete);
    }

    let commit = match state.goal {
        Goal::Full => state.grid.apex().sha1.expect("apex known, checked above"),
        Goal::Rebase | Goal::Revert => simplify_to_rebase(vcs, state)?,
        Goal::RebaseWithHistory => simplify_to_rebase_with_history(vcs, state)?,
        Goal::Border => simplify_to_border(vcs, state, false, false)?,
        Goal::BorderWithHistory => simplify_to_border(vcs, state, false, true)?,
        Goal::BorderWithHistory2 => simplify_to_border(vcs, state, true, true)?,
        Goal::Drop => simplify_to_drop(vcs, state)?,
        Goal::Merge => simplify_to_merge(vcs, state)?,
    };

    let ff_target = if state.goal == Goal::Drop { state.grid.apex().sha1 } else { None };
    set_refname_checked(vcs, refname, commit, force, ff_target)?;
    Ok(commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_object::{Object, Tree};
    use git_repository::Repository;
    use imerge_grid::{Goal, GoalOpts, Grid};
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
    fn chain_reuses_identical_commits_then_stops_on_first_mismatch() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let base = commit(&mut vcs, tree, &[], "base");
        let reusable = commit(&mut vcs, tree, &[base], "reusable");
        let divergent = commit(&mut vcs, tree, &[], "divergent metadata, different tree parent");

        let path = vec![(reusable, reusable), (divergent, divergent)];
        let result = create_commit_chain(&mut vcs, Some(base), &path).unwrap();

        assert_ne!(result, divergent, "second link must be freshly created, not reused");
        let parents = vcs.parents(&result).unwrap();
        assert_eq!(parents, vec![reusable], "first link was reused as-is");
    }

    #[test]
    fn chain_without_reuse_opportunity_creates_every_link() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let base = commit(&mut vcs, tree, &[], "base");
        let step_commit = commit(&mut vcs, tree, &[], "step body");
        let step_metadata = commit(&mut vcs, tree, &[], "step metadata");

        let path = vec![(step_commit, step_metadata)];
        let result = create_commit_chain(&mut vcs, Some(base), &path).unwrap();

        assert_ne!(result, step_commit);
        assert_eq!(vcs.parents(&result).unwrap(), vec![base]);
        assert_eq!(vcs.log_message(&result).unwrap(), vcs.log_message(&step_metadata).unwrap());
    }

    #[test]
    fn full_goal_simplifies_to_bare_apex() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let tip1 = commit(&mut vcs, tree, &[], "tip1");
        let tip2 = commit(&mut vcs, tree, &[], "tip2");
        let apex = commit(&mut vcs, tree, &[tip1, tip2], "apex");

        let mut grid = Grid::new(1, 1);
        grid.get_mut(0, 0).record_manual(tip1);
        grid.get_mut(1, 0).record_manual(tip1);
        grid.get_mut(0, 1).record_manual(tip2);
        grid.get_mut(1, 1).record_auto(apex);

        let state = MergeState::new(
            "full-test".to_string(),
            tip1,
            tip2,
            Goal::Full,
            GoalOpts::default(),
            false,
            "full-test".to_string(),
            grid,
        );

        let commit_out = simplify(&mut vcs, &state, "refs/heads/full-test", false).unwrap();
        assert_eq!(commit_out, apex);
    }

    #[test]
    fn drop_goal_requires_base() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let tip1 = commit(&mut vcs, tree, &[], "tip1");
        let tip2 = commit(&mut vcs, tree, &[], "tip2");
        let apex = commit(&mut vcs, tree, &[tip1, tip2], "apex");

        let mut grid = Grid::new(1, 1);
        grid.get_mut(0, 0).record_manual(tip1);
        grid.get_mut(1, 0).record_manual(tip1);
        grid.get_mut(0, 1).record_manual(tip2);
        grid.get_mut(1, 1).record_auto(apex);

        let state = MergeState::new(
            "drop-test".to_string(),
            tip1,
            tip2,
            Goal::Drop,
            GoalOpts::default(),
            false,
            "drop-test".to_string(),
            grid,
        );

        let err = simplify(&mut vcs, &state, "refs/heads/drop-test", false).unwrap_err();
        assert!(matches!(err, EngineError::DropGoalMissingBase));
    }

    fn drop_state(tip1: Oid, tip2: Oid, apex: Oid, base: Oid) -> MergeState {
        let mut grid = Grid::new(1, 1);
        grid.get_mut(0, 0).record_manual(tip1);
        grid.get_mut(1, 0).record_manual(tip1);
        grid.get_mut(0, 1).record_manual(tip2);
        grid.get_mut(1, 1).record_auto(apex);

        MergeState::new(
            "drop-test".to_string(),
            tip1,
            tip2,
            Goal::Drop,
            GoalOpts { base: Some(base), ..GoalOpts::default() },
            false,
            "drop-test".to_string(),
            grid,
        )
    }

    #[test]
    fn drop_ff_check_accepts_branch_still_behind_apex() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let pre_drop_base = commit(&mut vcs, tree, &[], "pre-drop-base");
        let tip1 = commit(&mut vcs, tree, &[], "tip1");
        let tip2 = commit(&mut vcs, tree, &[], "tip2");
        let apex = commit(&mut vcs, tree, &[tip1, tip2], "apex");

        // The branch's current tip (`tip1`) is an ancestor of the grid's
        // apex, so the drop should be allowed to fast-forward even though
        // `tip1` is not an ancestor of the freshly built drop commit.
        vcs.update_ref("refs/heads/drop-test", tip1, "setup").unwrap();

        let state = drop_state(tip1, tip2, apex, pre_drop_base);
        simplify(&mut vcs, &state, "refs/heads/drop-test", false).unwrap();
    }

    #[test]
    fn drop_ff_check_rejects_branch_diverged_from_apex() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let pre_drop_base = commit(&mut vcs, tree, &[], "pre-drop-base");
        let tip1 = commit(&mut vcs, tree, &[], "tip1");
        let tip2 = commit(&mut vcs, tree, &[], "tip2");
        let apex = commit(&mut vcs, tree, &[tip1, tip2], "apex");
        let diverged = commit(&mut vcs, tree, &[], "unrelated work on the branch");

        vcs.update_ref("refs/heads/drop-test", diverged, "setup").unwrap();

        let state = drop_state(tip1, tip2, apex, pre_drop_base);
        let err = simplify(&mut vcs, &state, "refs/heads/drop-test", false).unwrap_err();
        assert!(matches!(err, EngineError::NotFastForward { .. }));
    }
}
