//! Rebuild a commit with new parents and propagate that change along every
//! descendant up to a given tip, reusing [`imerge_vcs::Vcs::reparent`] for
//! the actual per-commit rewrite (§4.9).

use std::collections::HashMap;

use imerge_vcs::{Oid, Vcs, VcsError};

#[derive(Debug, thiserror::Error)]
pub enum ReparentError {
    #[error("{end} is not a descendant of {start}, so there is no ancestry path to rebuild")]
    NotADescendant { start: Oid, end: Oid },

    #[error(transparent)]
    Vcs(#[from] VcsError),
}

/// Rebuild `start` with `new_parents`, then walk every commit on the
/// ancestry path `start..end` (in chronological order) rebuilding each in
/// turn with its parents substituted via a memoization map, and return the
/// final replacement of `end`.
///
/// Fails with `NotADescendant` if `end` is not reachable from `start`.
pub fn reparent_chain(
    vcs: &mut dyn Vcs,
    start: &Oid,
    new_parents: &[Oid],
    end: &Oid,
) -> Result<Oid, ReparentError> {
    if !vcs.is_ancestor(start, end)? {
        return Err(ReparentError::NotADescendant { start: *start, end: *end });
    }

    let mut memo: HashMap<Oid, Oid> = HashMap::new();
    if start == end {
        let replacement = vcs.reparent(start, new_parents, None)?;
        return Ok(replacement);
    }
    memo.insert(*start, vcs.reparent(start, new_parents, None)?);

    // Visit every commit on the path in topological order (parents before
    // children) via a DFS that never revisits a node once it is resolved.
    let order = ancestry_path_order(vcs, start, end)?;
    for commit in order {
        if memo.contains_key(&commit) {
            continue;
        }
        let old_parents = vcs.parents(&commit)?;
        let mut rebuilt_parents = Vec::with_capacity(old_parents.len());
        for parent in &old_parents {
            let replacement = match memo.get(parent) {
                Some(r) => *r,
                None => *parent,
            };
            rebuilt_parents.push(replacement);
        }
        let rebuilt = vcs.reparent(&commit, &rebuilt_parents, None)?;
        memo.insert(commit, rebuilt);
    }

    Ok(*memo.get(end).expect("end is always visited by ancestry_path_order"))
}

/// Return every commit strictly between `start` (exclusive) and `end`
/// (inclusive) that lies on an ancestry path between them, in a topological
/// order (every commit's ancestry-path parents appear before it) — matching
/// `git rev-list --ancestry-path --topo-order --reverse`.
///
/// A plain preorder DFS reversal is not a valid topological order once the
/// path contains a merge commit: a sibling branch discovered early can end
/// up ordered before a commit it actually depends on. This instead runs an
/// iterative post-order DFS — a commit is only appended to the result once
/// every parent reachable from it (down to `start`) has already been
/// appended — which is a true topological order in any DAG.
fn ancestry_path_order(vcs: &dyn Vcs, start: &Oid, end: &Oid) -> Result<Vec<Oid>, VcsError> {
    enum State {
        Visiting,
        Done,
    }

    let mut state: HashMap<Oid, State> = HashMap::new();
    let mut order = Vec::new();
    // Stack entries are (commit, expanded): `expanded` is false the first
    // time a commit is pushed (its parents still need visiting first) and
    // true when it's pushed again after its parents, at which point it's
    // safe to append to `order`.
    let mut stack: Vec<(Oid, bool)> = vec![(*end, false)];

    while let Some((commit, expanded)) = stack.pop() {
        if expanded {
            order.push(commit);
            state.insert(commit, State::Done);
            continue;
        }
        if &commit == start {
            continue;
        }
        if matches!(state.get(&commit), Some(State::Visiting) | Some(State::Done)) {
            continue;
        }
        if !vcs.is_ancestor(start, &commit)? {
            continue;
        }
        state.insert(commit, State::Visiting);
        stack.push((commit, true));
        for parent in vcs.parents(&commit)? {
            stack.push((parent, false));
        }
    }

    Ok(order)
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
    fn rejects_non_descendant_end() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let a = commit(&mut vcs, tree, &[], "a");
        let b = commit(&mut vcs, tree, &[], "b");
        let err = reparent_chain(&mut vcs, &a, &[], &b).unwrap_err();
        assert!(matches!(err, ReparentError::NotADescendant { .. }));
    }

    #[test]
    fn rebuilds_straight_line_chain() {
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let root = commit(&mut vcs, tree, &[], "root");
        let mid = commit(&mut vcs, tree, &[root], "mid");
        let tip = commit(&mut vcs, tree, &[mid], "tip");

        let new_root_parent = commit(&mut vcs, tree, &[], "new-base");
        let replacement_tip =
            reparent_chain(&mut vcs, &root, &[new_root_parent], &tip).unwrap();

        assert_ne!(replacement_tip, tip);
        let final_parents = vcs.parents(&replacement_tip).unwrap();
        assert_eq!(final_parents.len(), 1);
        assert_ne!(final_parents[0], mid);
    }

    #[test]
    fn rebuilds_both_sides_of_a_merge() {
        // S -> A -> B \
        //        \ -> C -> end
        let (_dir, mut vcs) = new_repo();
        let tree = empty_tree(&mut vcs);
        let s = commit(&mut vcs, tree, &[], "s");
        let a = commit(&mut vcs, tree, &[s], "a");
        let b = commit(&mut vcs, tree, &[a], "b");
        let c = commit(&mut vcs, tree, &[a], "c");
        let end = commit(&mut vcs, tree, &[b, c], "end");

        let new_s_parent = commit(&mut vcs, tree, &[], "new-base");
        let replacement_end =
            reparent_chain(&mut vcs, &s, &[new_s_parent], &end).unwrap();

        let end_parents = vcs.parents(&replacement_end).unwrap();
        assert_eq!(end_parents.len(), 2);
        // Both the B-side and the C-side must end up rooted at the new base,
        // not just whichever side the traversal happened to resolve first.
        for side in end_parents {
            let mut cursor = side;
            loop {
                let parents = vcs.parents(&cursor).unwrap();
                if parents.is_empty() {
                    assert_eq!(cursor, new_s_parent);
                    break;
                }
                assert_eq!(parents.len(), 1);
                cursor = parents[0];
            }
        }
    }
}
