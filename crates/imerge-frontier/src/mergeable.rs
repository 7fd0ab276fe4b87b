use imerge_grid::{Grid, SubBlock};
use imerge_vcs::{Vcs, VcsError};

/// `is_mergeable` (§4.3): a known cell is trivially mergeable. An unknown
/// cell is probed by attempting a direct merge of its row/column boundary
/// commits; the probe's result (even on success) is discarded, never
/// written into the grid — only the frontier's yes/no answer is kept.
pub fn is_mergeable(
    vcs: &mut dyn Vcs,
    grid: &Grid,
    block: &SubBlock,
    i1: usize,
    i2: usize,
) -> Result<bool, VcsError> {
    if block.is_known(grid, i1, i2) {
        return Ok(true);
    }
    let (row0_1, row0_2) = block.translate(i1, 0);
    let (col0_1, col0_2) = block.translate(0, i2);
    let a = grid
        .get(row0_1, row0_2)
        .sha1
        .expect("row boundary of a probed block is always known");
    let b = grid
        .get(col0_1, col0_2)
        .sha1
        .expect("column boundary of a probed block is always known");
    match vcs.auto_merge(&a, &b, None) {
        Ok(_discarded_commit) => Ok(true),
        Err(VcsError::AutomaticMergeFailed { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
