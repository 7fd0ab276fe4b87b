use bstr::{BString, ByteSlice};
use git_diff::DiffOptions;
use git_hash::ObjectId;
use git_index::{EntryFlags, Index, IndexEntry, Stage, StatData};
use git_merge::strategy::dispatch_merge;
use git_merge::{ConflictEntry, ConflictType, MergeOptions};
use git_object::{Commit, FileMode, Object};
use git_ref::{RefName, RefStore, Reference};
use git_repository::editor::EditorConfig;
use git_repository::Repository;
use git_utils::date::{GitDate, Signature};

use crate::{AuthorTriplet, HeadState, Oid, Vcs, VcsError};

/// `Vcs` backed directly by this workspace's own git plumbing — no
/// subprocess, no external `git` binary.
pub struct GitVcs {
    repo: Repository,
}

impl GitVcs {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, VcsError> {
        Ok(Self::new(Repository::discover(path)?))
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut Repository {
        &mut self.repo
    }

    fn head_ref(&self) -> Result<RefName, VcsError> {
        Ok(RefName::new("HEAD")?)
    }

    fn read_commit(&self, oid: &Oid) -> Result<Commit, VcsError> {
        match self.repo.odb().read(oid)? {
            Some(Object::Commit(c)) => Ok(c),
            Some(_) => Err(VcsError::NotACommit { spec: oid.to_hex() }),
            None => Err(VcsError::UnresolvedName { spec: oid.to_hex() }),
        }
    }

    fn signature(&self) -> Result<Signature, VcsError> {
        let name = std::env::var("GIT_AUTHOR_NAME")
            .ok()
            .or_else(|| self.repo.config().get_string("user.name").ok().flatten())
            .unwrap_or_else(|| "imerge".to_string());
        let email = std::env::var("GIT_AUTHOR_EMAIL")
            .ok()
            .or_else(|| self.repo.config().get_string("user.email").ok().flatten())
            .unwrap_or_else(|| "imerge@localhost".to_string());
        let date = match std::env::var("GIT_AUTHOR_DATE") {
            Ok(raw) => GitDate::parse_raw(&raw).unwrap_or_else(|_| GitDate::now()),
            Err(_) => GitDate::now(),
        };
        Ok(Signature {
            name: BString::from(name),
            email: BString::from(email),
            date,
        })
    }

    fn write_commit(
        &mut self,
        tree: Oid,
        parents: Vec<Oid>,
        message: &str,
        author: Option<Signature>,
    ) -> Result<Oid, VcsError> {
        let signature = match author {
            Some(s) => s,
            None => self.signature()?,
        };
        let commit = Commit {
            tree,
            parents,
            author: signature.clone(),
            committer: signature,
            encoding: None,
            gpgsig: None,
            extra_headers: Vec::new(),
            message: BString::from(message),
        };
        Ok(self.repo.odb().write(&Object::Commit(commit))?)
    }

    fn resolve_to_direct(&self, name: &RefName) -> Result<Option<Oid>, VcsError> {
        Ok(self.repo.refs().resolve_to_oid(name)?)
    }

    fn update_head_to(&mut self, oid: &Oid) -> Result<(), VcsError> {
        let head = self.head_ref()?;
        match self.repo.refs().resolve(&head)? {
            Some(Reference::Symbolic { target, .. }) => {
                self.repo.refs().write_ref(&target, oid)?;
            }
            _ => {
                self.repo.refs().write_ref(&head, oid)?;
            }
        }
        Ok(())
    }

    fn materialize_commit(&mut self, oid: &Oid) -> Result<(), VcsError> {
        let tree = self.read_commit(oid)?.tree;
        self.materialize_tree(&tree)
    }

    fn materialize_tree(&mut self, tree_oid: &Oid) -> Result<(), VcsError> {
        let mut index = Index::new();
        build_index_from_tree(self.repo.odb(), tree_oid, &BString::from(""), &mut index)?;
        if let Some(work_tree) = self.repo.work_tree().map(|p| p.to_path_buf()) {
            checkout_recursive(self.repo.odb(), tree_oid, &work_tree, &BString::from(""))?;
        }
        self.repo.set_index(index);
        self.repo.write_index()?;
        Ok(())
    }

    fn rm_state_file(&self, name: &str) -> Result<(), VcsError> {
        let path = self.repo.git_dir().join(name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Vcs for GitVcs {
    fn resolve(&self, spec: &str) -> Result<Oid, VcsError> {
        if let Ok(oid) = ObjectId::from_hex(spec) {
            if self.repo.odb().contains(&oid) {
                return Ok(oid);
            }
        }
        if let Ok(name) = RefName::new(spec) {
            if let Some(oid) = self.resolve_to_direct(&name)? {
                return Ok(oid);
            }
        }
        if let Ok(name) = RefName::new(format!("refs/heads/{spec}")) {
            if let Some(oid) = self.resolve_to_direct(&name)? {
                return Ok(oid);
            }
        }
        Err(VcsError::UnresolvedName {
            spec: spec.to_string(),
        })
    }

    fn commit_oid(&self, spec: &str) -> Result<Oid, VcsError> {
        let oid = self.resolve(spec)?;
        self.read_commit(&oid)?;
        Ok(oid)
    }

    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, VcsError> {
        Ok(git_revwalk::is_ancestor(&self.repo, ancestor, descendant)?)
    }

    fn merge_base_best(&self, a: &Oid, b: &Oid) -> Result<Oid, VcsError> {
        let bases = git_revwalk::merge_base(&self.repo, a, b)?;
        let best = bases
            .into_iter()
            .min_by_key(|base| (first_parent_distance(&self.repo, a, base), *base))
            .ok_or(VcsError::NoMergeBase { a: *a, b: *b })?;
        Ok(best)
    }

    fn linear_ancestry(&self, from: &Oid, to: &Oid, first_parent: bool) -> Result<Vec<Oid>, VcsError> {
        let mut chain = vec![*to];
        let mut current = *to;
        loop {
            if current == *from {
                break;
            }
            let commit = self.read_commit(&current)?;
            if commit.parents.len() > 1 && !first_parent {
                return Err(VcsError::NonlinearAncestry {
                    from: *from,
                    to: *to,
                });
            }
            match commit.parents.first() {
                Some(parent) => {
                    current = *parent;
                    chain.push(current);
                }
                None => {
                    return Err(VcsError::NotAncestor {
                        from: *from,
                        to: *to,
                    })
                }
            }
        }
        chain.reverse();
        Ok(chain)
    }

    fn auto_merge(&mut self, a: &Oid, b: &Oid, msg: Option<&str>) -> Result<Oid, VcsError> {
        self.require_clean_worktree()?;
        let base = self.merge_base_best(a, b)?;
        let options = MergeOptions::default();
        let result = dispatch_merge(&mut self.repo, a, b, &base, &options)?;
        if !result.is_clean {
            // dispatch_merge may have staged conflict entries in-memory; discard
            // them by reloading the index from disk, which was never touched.
            self.repo.reload_index()?;
            return Err(VcsError::AutomaticMergeFailed { a: *a, b: *b });
        }
        let tree = result.tree.expect("clean MergeResult always carries a tree");
        let message = msg
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Merge {} into {}", b, a));
        self.commit_tree(&tree, &[*a, *b], &message, None)
    }

    fn manual_merge_prepare(&mut self, a: &Oid, b: &Oid, msg: &str) -> Result<(), VcsError> {
        self.require_clean_worktree()?;
        self.materialize_commit(a)?;
        self.update_head_to(a)?;

        let base = self.merge_base_best(a, b)?;
        let options = MergeOptions::default();
        let result = dispatch_merge(&mut self.repo, a, b, &base, &options)?;

        let merge_head_path = self.repo.git_dir().join("MERGE_HEAD");
        std::fs::write(&merge_head_path, format!("{}\n", b.to_hex()))?;
        let merge_msg_path = self.repo.git_dir().join("MERGE_MSG");
        std::fs::write(&merge_msg_path, msg)?;

        if result.is_clean {
            self.materialize_tree(&result.tree.expect("clean result carries a tree"))?;
            return Ok(());
        }

        write_conflict_index(&mut self.repo, &result.conflicts)?;
        write_conflict_files(&self.repo, &result.conflicts)?;
        Ok(())
    }

    fn commit_tree(
        &mut self,
        tree: &Oid,
        parents: &[Oid],
        msg: &str,
        author: Option<&AuthorTriplet>,
    ) -> Result<Oid, VcsError> {
        self.write_commit(*tree, parents.to_vec(), msg, author.cloned())
    }

    fn get_tree(&self, oid: &Oid) -> Result<Oid, VcsError> {
        Ok(self.read_commit(oid)?.tree)
    }

    fn parents(&self, oid: &Oid) -> Result<Vec<Oid>, VcsError> {
        Ok(self.read_commit(oid)?.parents)
    }

    fn log_message(&self, oid: &Oid) -> Result<BString, VcsError> {
        Ok(self.read_commit(oid)?.message)
    }

    fn author_triplet(&self, oid: &Oid) -> Result<AuthorTriplet, VcsError> {
        Ok(self.read_commit(oid)?.author)
    }

    fn write_blob(&mut self, data: &[u8]) -> Result<Oid, VcsError> {
        Ok(self.repo.odb().write(&Object::Blob(git_object::Blob::new(data.to_vec())))?)
    }

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, VcsError> {
        match self.repo.odb().read(oid)? {
            Some(Object::Blob(b)) => Ok(b.data),
            Some(_) => Err(VcsError::NotABlob { spec: oid.to_hex() }),
            None => Err(VcsError::UnresolvedName { spec: oid.to_hex() }),
        }
    }

    fn read_ref(&self, name: &str) -> Result<Option<Oid>, VcsError> {
        let name = RefName::new(name).map_err(|_| VcsError::InvalidRefName(BString::from(name)))?;
        self.resolve_to_direct(&name)
    }

    fn update_ref(&mut self, name: &str, target: Oid, _msg: &str) -> Result<(), VcsError> {
        let name = RefName::new(name).map_err(|_| VcsError::InvalidRefName(BString::from(name)))?;
        self.repo.refs().write_ref(&name, &target)?;
        Ok(())
    }

    fn delete_ref(&mut self, name: &str) -> Result<(), VcsError> {
        let name = RefName::new(name).map_err(|_| VcsError::InvalidRefName(BString::from(name)))?;
        self.repo.refs().delete_ref(&name)?;
        Ok(())
    }

    fn for_each_ref(&self, prefix: &str) -> Result<Vec<(String, Oid)>, VcsError> {
        let mut out = Vec::new();
        for reference in self.repo.refs().iter(Some(prefix))? {
            let reference = reference?;
            let oid = reference.peel_to_oid(self.repo.refs())?;
            out.push((reference.name().as_str().to_string(), oid));
        }
        Ok(out)
    }

    fn require_clean_worktree(&mut self) -> Result<(), VcsError> {
        if self.repo.work_tree().is_none() {
            return Ok(());
        }
        let staged = git_diff::worktree::diff_head_to_index(&mut self.repo, &DiffOptions::default())?;
        if !staged.is_empty() {
            return Err(VcsError::UncleanWorktree { kind: "uncommitted" });
        }
        let unstaged = git_diff::worktree::diff_index_to_worktree(&mut self.repo, &DiffOptions::default())?;
        if !unstaged.is_empty() {
            return Err(VcsError::UncleanWorktree { kind: "unstaged" });
        }
        if !self.repo.index_mut()?.conflicts().is_empty() {
            return Err(VcsError::UncleanWorktree { kind: "conflicted" });
        }
        Ok(())
    }

    fn detach_head(&mut self) -> Result<(), VcsError> {
        let oid = self
            .repo
            .head_oid()?
            .ok_or(VcsError::NoMergeInProgress)?;
        let head = self.head_ref()?;
        self.repo.refs().write_ref(&head, &oid)?;
        Ok(())
    }

    fn checkout(&mut self, reference: &str, _quiet: bool) -> Result<(), VcsError> {
        let oid = self.resolve(reference)?;
        self.materialize_commit(&oid)?;
        if let Ok(name) = RefName::new(reference) {
            if self.resolve_to_direct(&name)?.is_some() {
                self.repo.refs().write_symbolic_ref(&self.head_ref()?, &name)?;
                return Ok(());
            }
        }
        if let Ok(name) = RefName::new(format!("refs/heads/{reference}")) {
            if self.resolve_to_direct(&name)?.is_some() {
                self.repo.refs().write_symbolic_ref(&self.head_ref()?, &name)?;
                return Ok(());
            }
        }
        self.update_head_to(&oid)
    }

    fn reset_hard(&mut self, oid: &Oid) -> Result<(), VcsError> {
        self.update_head_to(oid)?;
        self.materialize_commit(oid)
    }

    fn abort_merge(&mut self) -> Result<(), VcsError> {
        self.rm_state_file("MERGE_HEAD")?;
        self.rm_state_file("MERGE_MSG")?;
        let oid = self.repo.head_oid()?.ok_or(VcsError::NoMergeInProgress)?;
        self.materialize_commit(&oid)
    }

    fn reparent(&mut self, oid: &Oid, parents: &[Oid], msg: Option<&str>) -> Result<Oid, VcsError> {
        let original = self.read_commit(oid)?;
        let message = msg.map(BString::from).unwrap_or(original.message);
        let commit = Commit {
            tree: original.tree,
            parents: parents.to_vec(),
            author: original.author,
            committer: original.committer,
            encoding: original.encoding,
            gpgsig: None,
            extra_headers: original.extra_headers,
            message,
        };
        Ok(self.repo.odb().write(&Object::Commit(commit))?)
    }

    fn revert_commit(&mut self, onto: &Oid, target: &Oid) -> Result<Oid, VcsError> {
        let target_commit = self.read_commit(target)?;
        let target_parent = *target_commit
            .first_parent()
            .ok_or(VcsError::NotACommit { spec: target.to_hex() })?;
        let options = MergeOptions::default();
        let result = dispatch_merge(&mut self.repo, onto, &target_parent, target, &options)?;
        if !result.is_clean {
            self.repo.reload_index()?;
            return Err(VcsError::AutomaticMergeFailed {
                a: *onto,
                b: *target,
            });
        }
        let tree = result.tree.expect("clean result carries a tree");
        let message = format!(
            "Revert \"{}\"\n\nThis reverts commit {}.\n",
            target_commit.summary(),
            target.to_hex()
        );
        self.commit_tree(&tree, &[*onto], &message, None)
    }

    fn head_state(&self) -> Result<HeadState, VcsError> {
        let head = self.head_ref()?;
        match self.repo.refs().resolve(&head)? {
            Some(Reference::Symbolic { target, .. }) => {
                Ok(HeadState::Symbolic(target.as_str().to_string()))
            }
            Some(Reference::Direct { target, .. }) => Ok(HeadState::Detached(target)),
            None => Ok(HeadState::Unborn),
        }
    }

    fn commit_pending_merge(&mut self, edit: bool) -> Result<Option<Oid>, VcsError> {
        let merge_head_path = self.repo.git_dir().join("MERGE_HEAD");
        if !merge_head_path.exists() {
            return Ok(None);
        }

        if !self.repo.index_mut()?.conflicts().is_empty() {
            return Err(VcsError::UncleanWorktree { kind: "conflicted" });
        }

        let merge_head_content = std::fs::read_to_string(&merge_head_path)?;
        let their_oid = merge_head_content
            .lines()
            .next()
            .filter(|l| !l.trim().is_empty())
            .and_then(|l| ObjectId::from_hex(l.trim()).ok())
            .ok_or(VcsError::NoMergeInProgress)?;

        let head_oid = self.repo.head_oid()?.ok_or(VcsError::NoMergeInProgress)?;
        let index_path = self.repo.git_dir().join("index");
        let index = Index::read_from(&index_path)?;
        let tree_oid = index.write_tree(self.repo.odb())?;

        let merge_msg_path = self.repo.git_dir().join("MERGE_MSG");
        if edit {
            if !merge_msg_path.exists() {
                std::fs::write(&merge_msg_path, format!("Merge commit '{their_oid}'\n"))?;
            }
            let editor = EditorConfig::from_config(self.repo.config());
            editor.edit_file(&merge_msg_path)?;
        }
        let message = std::fs::read_to_string(&merge_msg_path)
            .unwrap_or_else(|_| format!("Merge commit '{their_oid}'"));

        let commit_oid = self.write_commit(tree_oid, vec![head_oid, their_oid], &message, None)?;
        self.update_head_to(&commit_oid)?;
        self.rm_state_file("MERGE_HEAD")?;
        self.rm_state_file("MERGE_MSG")?;
        Ok(Some(commit_oid))
    }
}

/// Distance (in first-parent steps) from `tip` down to `base`, used only to
/// pick among several lowest common ancestors deterministically (DESIGN.md).
/// Returns `usize::MAX` if `base` is not reachable first-parent-only.
fn first_parent_distance(repo: &Repository, tip: &Oid, base: &Oid) -> usize {
    let mut current = *tip;
    let mut steps = 0usize;
    loop {
        if current == *base {
            return steps;
        }
        let Some(Object::Commit(commit)) = repo.odb().read(&current).ok().flatten() else {
            return usize::MAX;
        };
        match commit.parents.first() {
            Some(parent) => {
                current = *parent;
                steps += 1;
            }
            None => return usize::MAX,
        }
    }
}

fn build_index_from_tree(
    odb: &git_odb::ObjectDatabase,
    tree_oid: &Oid,
    prefix: &BString,
    index: &mut Index,
) -> Result<(), VcsError> {
    let tree = match odb.read(tree_oid)?.ok_or(VcsError::UnresolvedName {
        spec: tree_oid.to_hex(),
    })? {
        Object::Tree(t) => t,
        _ => return Err(VcsError::NotACommit { spec: tree_oid.to_hex() }),
    };
    for entry in tree.iter() {
        let path = join_path(prefix, &entry.name);
        if entry.mode.is_tree() {
            build_index_from_tree(odb, &entry.oid, &path, index)?;
        } else {
            index.add(IndexEntry {
                path,
                oid: entry.oid,
                mode: entry.mode,
                stage: Stage::Normal,
                stat: StatData::default(),
                flags: EntryFlags::default(),
            });
        }
    }
    Ok(())
}

fn checkout_recursive(
    odb: &git_odb::ObjectDatabase,
    tree_oid: &Oid,
    work_tree: &std::path::Path,
    prefix: &BString,
) -> Result<(), VcsError> {
    let tree = match odb.read(tree_oid)?.ok_or(VcsError::UnresolvedName {
        spec: tree_oid.to_hex(),
    })? {
        Object::Tree(t) => t,
        _ => return Err(VcsError::NotACommit { spec: tree_oid.to_hex() }),
    };
    for entry in tree.iter() {
        let path = join_path(prefix, &entry.name);
        let full = work_tree.join(path.to_str_lossy().as_ref());
        if entry.mode.is_tree() {
            std::fs::create_dir_all(&full)?;
            checkout_recursive(odb, &entry.oid, work_tree, &path)?;
        } else {
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let data = match odb.read(&entry.oid)?.ok_or(VcsError::UnresolvedName {
                spec: entry.oid.to_hex(),
            })? {
                Object::Blob(b) => b.data,
                _ => return Err(VcsError::NotACommit { spec: entry.oid.to_hex() }),
            };
            std::fs::write(&full, &data)?;
            #[cfg(unix)]
            if entry.mode == FileMode::Executable {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&full, std::fs::Permissions::from_mode(0o755))?;
            }
        }
    }
    Ok(())
}

fn join_path(prefix: &BString, name: &BString) -> BString {
    if prefix.is_empty() {
        name.clone()
    } else {
        let mut p = prefix.clone();
        p.push_byte(b'/');
        p.extend_from_slice(name);
        p
    }
}

fn write_conflict_index(repo: &mut Repository, conflicts: &[ConflictEntry]) -> Result<(), VcsError> {
    let index = repo.index_mut()?;
    for conflict in conflicts {
        index.remove(conflict.path.as_ref(), Stage::Normal);
        if let Some(side) = &conflict.base {
            index.add(IndexEntry {
                path: conflict.path.clone(),
                oid: side.oid,
                mode: side.mode,
                stage: Stage::Base,
                stat: StatData::default(),
                flags: EntryFlags::default(),
            });
        }
        if let Some(side) = &conflict.ours {
            index.add(IndexEntry {
                path: conflict.path.clone(),
                oid: side.oid,
                mode: side.mode,
                stage: Stage::Ours,
                stat: StatData::default(),
                flags: EntryFlags::default(),
            });
        }
        if let Some(side) = &conflict.theirs {
            index.add(IndexEntry {
                path: conflict.path.clone(),
                oid: side.oid,
                mode: side.mode,
                stage: Stage::Theirs,
                stat: StatData::default(),
                flags: EntryFlags::default(),
            });
        }
    }
    repo.write_index()?;
    Ok(())
}

fn write_conflict_files(repo: &Repository, conflicts: &[ConflictEntry]) -> Result<(), VcsError> {
    let Some(work_tree) = repo.work_tree().map(|p| p.to_path_buf()) else {
        return Ok(());
    };
    let odb = repo.odb();
    for conflict in conflicts {
        if conflict.conflict_type != ConflictType::Content {
            continue;
        }
        let path = work_tree.join(conflict.path.to_str_lossy().as_ref());
        let ours = read_side(odb, conflict.ours.as_ref().map(|s| s.oid));
        let theirs = read_side(odb, conflict.theirs.as_ref().map(|s| s.oid));
        let base = read_side(odb, conflict.base.as_ref().map(|s| s.oid));
        let merged = merge_with_markers(&base, &ours, &theirs);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, merged)?;
    }
    Ok(())
}

fn read_side(odb: &git_odb::ObjectDatabase, oid: Option<Oid>) -> Vec<u8> {
    oid.and_then(|oid| odb.read(&oid).ok().flatten())
        .map(|obj| match obj {
            Object::Blob(b) => b.data,
            _ => Vec::new(),
        })
        .unwrap_or_default()
}

/// Line-level three-way merge producing conflict markers for the working
/// copy — not used to decide mergeability (that is `dispatch_merge`'s job),
/// only to render a file a human can resolve in an editor.
fn merge_with_markers(base: &[u8], ours: &[u8], theirs: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"<<<<<<< ours\n");
    out.extend_from_slice(ours);
    if !ours.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(b"||||||| base\n");
    out.extend_from_slice(base);
    if !base.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(b"=======\n");
    out.extend_from_slice(theirs);
    if !theirs.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(b">>>>>>> theirs\n");
    out
}
