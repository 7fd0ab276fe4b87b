//! Ref-namespace persistence (§4.2/§6): one ref per known cell, plus a
//! `state` blob ref carrying everything else.

use git_hash::ObjectId;
use imerge_vcs::{Oid, Vcs};
use serde::{Deserialize, Serialize};

use crate::cell::Source;
use crate::grid::Grid;
use crate::state::{Goal, GoalOpts, MergeState};

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("merge {i1}-{i2} is missing")]
    MissingCell { i1: usize, i2: usize },

    #[error("corrupt ref name under imerge namespace: {0:?}")]
    CorruptRefName(String),

    #[error("corrupt state blob: {0}")]
    CorruptStateBlob(String),

    #[error("no imerge named {0:?}")]
    NoSuchMerge(String),

    #[error(
        "state version {found:?} is not compatible with this build (expects 1.x, x <= {max_minor})"
    )]
    IncompatibleVersion { found: String, max_minor: u32 },

    #[error(transparent)]
    Vcs(#[from] imerge_vcs::VcsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

const STATE_MAJOR: u32 = 1;
const STATE_MINOR: u32 = 3;
const STATE_PATCH: u32 = 0;

pub fn namespace(name: &str) -> String {
    format!("refs/imerge/{name}")
}

fn cell_ref(ns: &str, source: Source, i1: usize, i2: usize) -> String {
    let dir = match source {
        Source::Auto => "auto",
        Source::Manual => "manual",
    };
    format!("{ns}/{dir}/{i1}-{i2}")
}

fn state_ref(ns: &str) -> String {
    format!("{ns}/state")
}

/// Save protocol (§4.2): cell refs before the state blob, so any cell ref a
/// reader sees is already covered by a state blob that tolerates it (§5).
pub fn save(vcs: &mut dyn Vcs, state: &mut MergeState) -> Result<(), GridError> {
    let ns = namespace(&state.name);
    for (i1, i2) in state.grid.coords() {
        save_cell(vcs, &ns, &mut state.grid, i1, i2)?;
    }
    write_state_blob(vcs, &ns, state)?;
    Ok(())
}

fn save_cell(vcs: &mut dyn Vcs, ns: &str, grid: &mut Grid, i1: usize, i2: usize) -> Result<(), GridError> {
    let cell = *grid.get(i1, i2);

    // Step 1: MANUAL supersedes AUTO — any auto ref is cleared outright.
    if (cell.new_manual || cell.saved_manual) && cell.saved_auto {
        vcs.delete_ref(&cell_ref(ns, Source::Auto, i1, i2))?;
        grid.get_mut(i1, i2).saved_auto = false;
    }

    // Step 2: NEW_* is upgraded to SAVED_* by writing its ref; an absent
    // sha1 with a stale SAVED ref deletes that ref. Cells with neither a
    // NEW nor a SAVED flag are skipped — nothing was ever written for them.
    let cell = *grid.get(i1, i2);
    if cell.new_manual {
        let oid = cell.sha1.expect("new_manual implies a commit");
        vcs.update_ref(&cell_ref(ns, Source::Manual, i1, i2), oid, "imerge: record manual merge")?;
        let slot = grid.get_mut(i1, i2);
        slot.saved_manual = true;
        slot.new_manual = false;
    } else if cell.new_auto {
        let oid = cell.sha1.expect("new_auto implies a commit");
        vcs.update_ref(&cell_ref(ns, Source::Auto, i1, i2), oid, "imerge: record auto merge")?;
        let slot = grid.get_mut(i1, i2);
        slot.saved_auto = true;
        slot.new_auto = false;
    } else if cell.sha1.is_none() {
        if cell.saved_manual {
            vcs.delete_ref(&cell_ref(ns, Source::Manual, i1, i2))?;
            grid.get_mut(i1, i2).saved_manual = false;
        }
        if cell.saved_auto {
            vcs.delete_ref(&cell_ref(ns, Source::Auto, i1, i2))?;
            grid.get_mut(i1, i2).saved_auto = false;
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct GoalOptsBlob {
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<String>,
}

/// Field order is alphabetical, matching §6's "keys must be sorted": derived
/// struct serialization writes fields in declaration order, so the sort is
/// encoded once here rather than re-derived at every call site.
#[derive(Serialize, Deserialize)]
struct StateBlob {
    blockers: Vec<(usize, usize)>,
    branch: String,
    goal: String,
    goalopts: Option<GoalOptsBlob>,
    manual: bool,
    tip1: String,
    tip2: String,
    version: String,
}

fn write_state_blob(vcs: &mut dyn Vcs, ns: &str, state: &MergeState) -> Result<(), GridError> {
    let blob = StateBlob {
        blockers: state.blockers(),
        branch: state.branch.clone(),
        goal: state.goal.as_str().to_string(),
        goalopts: if state.goalopts.is_empty() {
            None
        } else {
            Some(GoalOptsBlob {
                base: state.goalopts.base.map(|o| o.to_hex()),
            })
        },
        manual: state.manual,
        tip1: state.tip1.to_hex(),
        tip2: state.tip2.to_hex(),
        version: format!("{STATE_MAJOR}.{STATE_MINOR}.{STATE_PATCH}"),
    };
    let mut json = serde_json::to_string(&blob)?;
    json.push('\n');
    let oid = vcs.write_blob(json.as_bytes())?;
    vcs.update_ref(&state_ref(ns), oid, "imerge: save state")?;
    Ok(())
}

fn parse_version(v: &str) -> Option<(u32, u32, u32)> {
    let mut parts = v.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// Read protocol (§4.2/8.f): enumerate refs, reconstruct cells from
/// `SAVED_AUTO`/`SAVED_MANUAL`, then apply blockers. Boundary entries must
/// be present, manual, and contiguous, or this fails with a corrupt-state
/// error naming the first missing index (scenario f).
pub fn read(vcs: &dyn Vcs, name: &str) -> Result<MergeState, GridError> {
    let ns = namespace(name);
    let refs = vcs.for_each_ref(&format!("{ns}/"))?;
    if refs.is_empty() {
        return Err(GridError::NoSuchMerge(name.to_string()));
    }

    let mut cells: Vec<(Source, usize, usize, Oid)> = Vec::new();
    let mut state_oid = None;
    for (full_name, oid) in &refs {
        let rest = full_name
            .strip_prefix(&format!("{ns}/"))
            .ok_or_else(|| GridError::CorruptRefName(full_name.clone()))?;
        if rest == "state" {
            state_oid = Some(*oid);
            continue;
        }
        let (source_str, indices) = rest
            .split_once('/')
            .ok_or_else(|| GridError::CorruptRefName(full_name.clone()))?;
        let source = match source_str {
            "auto" => Source::Auto,
            "manual" => Source::Manual,
            _ => return Err(GridError::CorruptRefName(full_name.clone())),
        };
        let (i1_str, i2_str) = indices
            .split_once('-')
            .ok_or_else(|| GridError::CorruptRefName(full_name.clone()))?;
        let i1: usize = i1_str
            .parse()
            .map_err(|_| GridError::CorruptRefName(full_name.clone()))?;
        let i2: usize = i2_str
            .parse()
            .map_err(|_| GridError::CorruptRefName(full_name.clone()))?;
        cells.push((source, i1, i2, *oid));
    }

    let state_oid = state_oid.ok_or_else(|| GridError::CorruptStateBlob("missing state ref".to_string()))?;
    let blob_bytes = vcs.read_blob(&state_oid)?;
    let blob: StateBlob = serde_json::from_slice(&blob_bytes)
        .map_err(|e| GridError::CorruptStateBlob(e.to_string()))?;

    let (major, minor, _patch) = parse_version(&blob.version)
        .ok_or_else(|| GridError::CorruptStateBlob(format!("unparseable version {:?}", blob.version)))?;
    if major != STATE_MAJOR || minor > STATE_MINOR {
        return Err(GridError::IncompatibleVersion {
            found: blob.version,
            max_minor: STATE_MINOR,
        });
    }

    let m = cells.iter().filter(|&&(_, _, i2, _)| i2 == 0).map(|&(_, i1, _, _)| i1).max().unwrap_or(0);
    let n = cells.iter().filter(|&&(_, i1, _, _)| i1 == 0).map(|&(_, _, i2, _)| i2).max().unwrap_or(0);

    let mut grid = Grid::new(m, n);
    for (source, i1, i2, oid) in cells {
        *grid.get_mut(i1, i2) = crate::cell::MergeRecord::from_saved(source, oid);
    }

    for i1 in 0..=m {
        let cell = grid.get(i1, 0);
        if !cell.is_known() || !cell.saved_manual {
            return Err(GridError::MissingCell { i1, i2: 0 });
        }
    }
    for i2 in 0..=n {
        let cell = grid.get(0, i2);
        if !cell.is_known() || !cell.saved_manual {
            return Err(GridError::MissingCell { i1: 0, i2 });
        }
    }

    for (i1, i2) in blob.blockers {
        grid.get_mut(i1, i2).mark_blocked();
    }

    let tip1 = parse_oid(&blob.tip1)?;
    let tip2 = parse_oid(&blob.tip2)?;
    let goal = Goal::parse(&blob.goal)
        .ok_or_else(|| GridError::CorruptStateBlob(format!("unknown goal {:?}", blob.goal)))?;
    let goalopts = match blob.goalopts {
        Some(opts) => GoalOpts {
            base: opts.base.map(|s| parse_oid(&s)).transpose()?,
        },
        None => GoalOpts::default(),
    };

    Ok(MergeState::new(name.to_string(), tip1, tip2, goal, goalopts, blob.manual, blob.branch, grid))
}

fn parse_oid(hex: &str) -> Result<Oid, GridError> {
    ObjectId::from_hex(hex).map_err(|e| GridError::CorruptStateBlob(e.to_string()))
}

/// Delete every ref under the merge's namespace, including the state blob.
pub fn remove(vcs: &mut dyn Vcs, name: &str) -> Result<(), GridError> {
    let ns = namespace(name);
    let refs = vcs.for_each_ref(&format!("{ns}/"))?;
    for (full_name, _) in refs {
        vcs.delete_ref(&full_name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses() {
        assert_eq!(parse_version("1.3.0"), Some((1, 3, 0)));
        assert_eq!(parse_version("1.3"), None);
        assert_eq!(parse_version("a.b.c"), None);
    }

    #[test]
    fn state_blob_json_has_sorted_keys_and_trailing_newline() {
        let blob = StateBlob {
            blockers: vec![(2, 2)],
            branch: "result".to_string(),
            goal: "merge".to_string(),
            goalopts: None,
            manual: false,
            tip1: "a".repeat(40),
            tip2: "b".repeat(40),
            version: "1.3.0".to_string(),
        };
        let json = serde_json::to_string(&blob).unwrap();
        let keys: Vec<&str> = json
            .trim_start_matches('{')
            .trim_end_matches('}')
            .split(',')
            .map(|kv| kv.split(':').next().unwrap().trim().trim_matches('"'))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
