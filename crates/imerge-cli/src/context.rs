//! Shared setup every subcommand needs: opening the repository, resolving
//! which merge `--name` refers to, and reading/writing `imerge.default`.
//! Grounded in `git-cli::commands::{mod::open_repo, config}` and the
//! original Python's `choose_merge_name`/`get_default_imerge_name`.

use anyhow::{anyhow, bail, Context, Result};
use git_config::ConfigScope;
use git_repository::Repository;
use imerge_vcs::{GitVcs, HeadState, Oid, Vcs};
use regex::Regex;

pub fn open_vcs() -> Result<GitVcs> {
    let repo = Repository::discover(".").context("not a git repository")?;
    Ok(GitVcs::new(repo))
}

/// The branch HEAD is currently on, without the `refs/heads/` prefix, or
/// `None` if HEAD is detached or unborn. Several commands default `--branch`
/// or `tip1` to this (matches the original's `get_default_branch`).
pub fn current_branch(vcs: &GitVcs) -> Option<String> {
    match vcs.head_state().ok()? {
        HeadState::Symbolic(target) => target.strip_prefix("refs/heads/").map(str::to_string),
        _ => None,
    }
}

/// Whether intermediate user merges should be committed with the editor
/// open, per `imerge.editmergemessages` (default false).
pub fn default_edit(vcs: &GitVcs) -> bool {
    vcs.repo().config().get_bool_or("imerge.editmergemessages", false).unwrap_or(false)
}

pub fn get_default_name(vcs: &GitVcs) -> Option<String> {
    vcs.repo().config().get_string("imerge.default").ok().flatten()
}

pub fn set_default_name(vcs: &mut GitVcs, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            vcs.repo_mut().config_mut().set("imerge.default", name, ConfigScope::Local)?;
        }
        None => {
            let _ = vcs.repo_mut().config_mut().remove("imerge.default", ConfigScope::Local);
        }
    }
    Ok(())
}

/// Resolve `--name` to a concrete merge name, matching the original's
/// `choose_merge_name`: an explicit name must exist; otherwise fall back to
/// the configured default, clearing it if it's gone stale.
pub fn choose_merge_name(vcs: &mut GitVcs, name: Option<&str>) -> Result<String> {
    let names = imerge_engine::list_merges(vcs)?;

    if let Some(name) = name {
        if !names.iter().any(|n| n == name) {
            bail!("there is no incremental merge called '{name}'");
        }
        if names.len() > 1 {
            set_default_name(vcs, Some(name))?;
        }
        return Ok(name.to_string());
    }

    if let Some(default_name) = get_default_name(vcs) {
        if names.iter().any(|n| n == &default_name) {
            return Ok(default_name);
        }
        set_default_name(vcs, None)?;
        bail!(
            "the default merge '{default_name}' no longer exists; please specify --name"
        );
    }

    match names.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(anyhow!("there is no incremental merge in progress")),
        _ => Err(anyhow!(
            "more than one incremental merge is in progress; please specify --name"
        )),
    }
}

/// After creating a new merge, make it the default if it's no longer the
/// only one (matches every `cmd_*` entry point in the original).
pub fn maybe_set_new_default(vcs: &mut GitVcs, name: &str) -> Result<()> {
    if imerge_engine::list_merges(vcs)?.len() > 1 {
        set_default_name(vcs, Some(name))?;
    }
    Ok(())
}

/// Parse a `drop`/`revert` range argument: either `commit..commit` or a
/// single `commit` (whose implicit start is `commit^`). Mirrors the
/// original's `re.match(r'^(?P<start>.*[^\.])(?P<sep>\.{2,})(?P<end>[^\.].*)$')`.
pub fn parse_range(vcs: &GitVcs, range: &str) -> Result<(Oid, Oid)> {
    let re = Regex::new(r"^(?P<start>.*[^.])(?P<sep>\.{2,})(?P<end>[^.].*)$").unwrap();
    if let Some(caps) = re.captures(range) {
        if &caps["sep"] != ".." {
            bail!("range must either be a single commit or in the form \"commit..commit\"");
        }
        let start = vcs.commit_oid(&caps["start"])?;
        let end = vcs.commit_oid(&caps["end"])?;
        Ok((start, end))
    } else {
        let end = vcs.commit_oid(range)?;
        let start = vcs.commit_oid(&format!("{range}^"))?;
        Ok((start, end))
    }
}

/// `parse_range`, stringified to oids so callers can hand the result
/// straight to engine entry points that take string specs.
pub fn parse_range_specs(vcs: &GitVcs, range: &str) -> Result<(String, String)> {
    let (start, end) = parse_range(vcs, range)?;
    Ok((start.to_string(), end.to_string()))
}

/// Prepare the scratch branch for a blocked cell and print the same
/// instructions as the original's `request_user_merge`.
pub fn report_blocked(
    vcs: &mut GitVcs,
    state: &imerge_grid::MergeState,
    i1: usize,
    i2: usize,
) -> Result<()> {
    imerge_engine::orchestrator::start_manual_merge(vcs, state, i1, i2)?;
    eprintln!(
        "\nThere was a conflict merging commit {i1}-{i2}.\n\
         Please resolve the conflict, commit the result, then type\n\
         \n    imerge continue\n"
    );
    Ok(())
}
