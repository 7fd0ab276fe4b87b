use git_object::{Object, Tree};
use git_repository::Repository;
use imerge_grid::{persist, Goal, GoalOpts, Grid, MergeState};
use imerge_vcs::{GitVcs, Vcs};

fn new_repo() -> (tempfile::TempDir, GitVcs) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init_bare(dir.path()).unwrap();
    (dir, GitVcs::new(repo))
}

fn commit_chain(vcs: &mut GitVcs, n: usize) -> Vec<imerge_vcs::Oid> {
    let empty_tree = vcs.repo_mut().odb().write(&Object::Tree(Tree::new())).unwrap();
    let mut chain = Vec::new();
    let mut parents = Vec::new();
    for i in 0..=n {
        let msg = format!("commit {i}");
        let oid = vcs.commit_tree(&empty_tree, &parents, &msg, None).unwrap();
        chain.push(oid);
        parents = vec![oid];
    }
    chain
}

#[test]
fn round_trip_preserves_boundary_blockers_and_goal() {
    let (_dir, mut vcs) = new_repo();
    let a = commit_chain(&mut vcs, 2); // base, A[1], A[2]
    let c = commit_chain(&mut vcs, 3); // reused empty tree, unrelated chain for C[]

    let mut grid = Grid::new(2, 3);
    // boundary: M[0,0] = base (reuse a[0] as the shared base)
    grid.get_mut(0, 0).record_manual(a[0]);
    grid.get_mut(1, 0).record_manual(a[1]);
    grid.get_mut(2, 0).record_manual(a[2]);
    grid.get_mut(0, 1).record_manual(c[1]);
    grid.get_mut(0, 2).record_manual(c[2]);
    grid.get_mut(0, 3).record_manual(c[3]);
    grid.get_mut(1, 1).record_auto(a[1]);
    grid.get_mut(2, 2).mark_blocked();

    let mut state = MergeState::new(
        "demo".to_string(),
        a[2],
        c[3],
        Goal::Rebase,
        GoalOpts::default(),
        false,
        "imerge/demo/result".to_string(),
        grid,
    );

    persist::save(&mut vcs, &mut state).unwrap();
    let read_back = persist::read(&vcs, "demo").unwrap();

    assert_eq!(read_back.tip1, a[2]);
    assert_eq!(read_back.tip2, c[3]);
    assert_eq!(read_back.goal.as_str(), "rebase");
    assert_eq!(read_back.branch, "imerge/demo/result");
    assert_eq!(read_back.grid.get(0, 0).sha1, Some(a[0]));
    assert_eq!(read_back.grid.get(2, 0).sha1, Some(a[2]));
    assert_eq!(read_back.grid.get(0, 3).sha1, Some(c[3]));
    assert_eq!(read_back.grid.get(1, 1).sha1, Some(a[1]));
    assert!(read_back.grid.get(1, 1).saved_auto);
    assert!(read_back.grid.get(2, 2).blocked);
    assert!(!read_back.grid.get(2, 2).is_known());
    assert_eq!(read_back.blockers(), vec![(2, 2)]);
}

#[test]
fn manual_override_deletes_stale_auto_ref() {
    let (_dir, mut vcs) = new_repo();
    let a = commit_chain(&mut vcs, 1);
    let c = commit_chain(&mut vcs, 1);

    let mut grid = Grid::new(1, 1);
    grid.get_mut(0, 0).record_manual(a[0]);
    grid.get_mut(1, 0).record_manual(a[1]);
    grid.get_mut(0, 1).record_manual(c[1]);
    grid.get_mut(1, 1).record_auto(a[1]);

    let mut state = MergeState::new(
        "demo2".to_string(),
        a[1],
        c[1],
        Goal::Full,
        GoalOpts::default(),
        false,
        "imerge/demo2/result".to_string(),
        grid,
    );
    persist::save(&mut vcs, &mut state).unwrap();
    assert!(vcs.read_ref("refs/imerge/demo2/auto/1-1").unwrap().is_some());

    state.grid.get_mut(1, 1).record_manual(c[1]);
    persist::save(&mut vcs, &mut state).unwrap();

    assert!(vcs.read_ref("refs/imerge/demo2/auto/1-1").unwrap().is_none());
    assert!(vcs.read_ref("refs/imerge/demo2/manual/1-1").unwrap().is_some());

    let read_back = persist::read(&vcs, "demo2").unwrap();
    assert!(read_back.grid.get(1, 1).saved_manual);
    assert!(!read_back.grid.get(1, 1).saved_auto);
}

#[test]
fn remove_deletes_every_ref_under_namespace() {
    let (_dir, mut vcs) = new_repo();
    let a = commit_chain(&mut vcs, 1);
    let c = commit_chain(&mut vcs, 1);
    let mut grid = Grid::new(1, 1);
    grid.get_mut(0, 0).record_manual(a[0]);
    grid.get_mut(1, 0).record_manual(a[1]);
    grid.get_mut(0, 1).record_manual(c[1]);
    let mut state = MergeState::new(
        "demo3".to_string(),
        a[1],
        c[1],
        Goal::Full,
        GoalOpts::default(),
        false,
        "imerge/demo3/result".to_string(),
        grid,
    );
    persist::save(&mut vcs, &mut state).unwrap();
    persist::remove(&mut vcs, "demo3").unwrap();
    assert!(persist::read(&vcs, "demo3").is_err());
}
