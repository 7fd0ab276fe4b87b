use imerge_grid::{Grid, SubBlock};
use imerge_vcs::Vcs;

use crate::blocks::{find_frontier_blocks, normalize, remove_failure};
use crate::error::FrontierError;
use crate::outline::auto_outline;

/// A strategy for filling the part of a `Grid` not yet known (§4.7, §9).
///
/// `Full` and `Manual` both require every cell to be filled before the merge
/// is complete; they differ in whether gaps are closed automatically or left
/// for the user. `Blockwise` is the auto-merge strategy: it tracks the set
/// of maximal rectangles believed mergeable and expands them one outline at
/// a time, backtracking when an outline turns out to be wrong.
pub enum MergeFrontier {
    Full,
    Manual,
    Blockwise(Vec<SubBlock>),
}

impl MergeFrontier {
    /// Reconstruct the frontier implied by a grid's current contents
    /// (§9's `map_known_frontier`): the largest set of rectangles, each
    /// anchored at the grid's origin-adjacent edges, whose interior is
    /// entirely known and unblocked.
    pub fn map_known_frontier(grid: &Grid, manual: bool) -> Self {
        if manual {
            return MergeFrontier::Manual;
        }
        let whole = SubBlock::whole(grid);
        if grid.is_known(grid.m(), grid.n()) {
            return MergeFrontier::Full;
        }
        let mut blocks = Vec::new();
        let mut len1 = 1;
        while len1 < whole.len1 && whole.is_known(grid, len1, 1) {
            len1 += 1;
        }
        let mut len2 = 1;
        while len2 < whole.len2 && whole.is_known(grid, 1, len2) {
            len2 += 1;
        }
        if len1 > 1 || len2 > 1 {
            blocks.push(whole.sub(0, 0, len1.max(1), len2.max(1)));
        }
        MergeFrontier::Blockwise(normalize(blocks))
    }

    pub fn is_complete(&self, grid: &Grid) -> bool {
        match self {
            MergeFrontier::Full | MergeFrontier::Manual => grid.is_known(grid.m(), grid.n()),
            MergeFrontier::Blockwise(blocks) => blocks.len() == 1
                && blocks[0].len1 == grid.m() + 1
                && blocks[0].len2 == grid.n() + 1,
        }
    }

    /// Incorporate a user-supplied merge at `(i1, i2)` that the frontier had
    /// previously marked blocked (§4.6). Only meaningful for `Full`/`Manual`
    /// frontiers; `Blockwise` cells never carry the blocked bit once they
    /// are covered by a recorded block.
    pub fn incorporate_merge(&self, grid: &mut Grid, i1: usize, i2: usize) {
        grid.get_mut(i1, i2).clear_blocked();
    }

    /// Drive the frontier forward automatically (§4.5), discovering and
    /// outlining mergeable rectangles until the whole grid is known, a
    /// conflict blocks further progress, or (for `Full`/`Manual`) every
    /// remaining gap needs a user merge.
    ///
    /// Returns `Ok(())` once the grid is fully known. A conflict surfaces as
    /// `FrontierError::FrontierBlocked`; for `Manual`, any unfilled cell does.
    pub fn auto_expand(
        &mut self,
        vcs: &mut dyn Vcs,
        grid: &mut Grid,
        name: &str,
    ) -> Result<(), FrontierError> {
        match self {
            MergeFrontier::Full => full_auto_expand(vcs, grid, name),
            MergeFrontier::Manual => manual_auto_expand(grid),
            MergeFrontier::Blockwise(blocks) => blockwise_auto_expand(vcs, grid, name, blocks),
        }
    }
}

fn full_auto_expand(vcs: &mut dyn Vcs, grid: &mut Grid, name: &str) -> Result<(), FrontierError> {
    let whole = SubBlock::whole(grid);
    for i1 in 1..whole.len1 {
        for i2 in 1..whole.len2 {
            if whole.is_known(grid, i1, i2) {
                continue;
            }
            if whole.get(grid, i1, i2).blocked {
                return Err(FrontierError::FrontierBlocked {
                    i1: whole.translate(i1, i2).0,
                    i2: whole.translate(i1, i2).1,
                });
            }
            let left = whole.get(grid, i1 - 1, i2).sha1;
            let above = whole.get(grid, i1, i2 - 1).sha1;
            let (left, above) = match (left, above) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let log_msg = format!("imerge '{name}': automatic merge {i1}-{i2}");
            match vcs.auto_merge(&left, &above, Some(&log_msg)) {
                Ok(oid) => {
                    whole.get_mut(grid, i1, i2).record_auto(oid);
                }
                Err(imerge_vcs::VcsError::AutomaticMergeFailed { .. }) => {
                    whole.get_mut(grid, i1, i2).mark_blocked();
                    return Err(FrontierError::FrontierBlocked { i1, i2 });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    Ok(())
}

fn manual_auto_expand(grid: &Grid) -> Result<(), FrontierError> {
    let whole = SubBlock::whole(grid);
    for i1 in 1..whole.len1 {
        for i2 in 1..whole.len2 {
            if !whole.is_known(grid, i1, i2) {
                let (gi1, gi2) = whole.translate(i1, i2);
                return Err(FrontierError::FrontierBlocked { i1: gi1, i2: gi2 });
            }
        }
    }
    Ok(())
}

/// The backtracking loop (§4.5): always attack the first (bottom-leftmost)
/// block in the list. A successful outline folds that block's interior
/// into the grid and the block is dropped, since its cells are now known by
/// direct lookup rather than needing re-outlining. A failure shrinks the
/// block list in place and restarts from its new first entry.
fn blockwise_auto_expand(
    vcs: &mut dyn Vcs,
    grid: &mut Grid,
    name: &str,
    blocks: &mut Vec<SubBlock>,
) -> Result<(), FrontierError> {
    if blocks.is_empty() {
        *blocks = find_frontier_blocks(vcs, grid, SubBlock::whole(grid))?;
    }
    loop {
        let Some(&first) = blocks.first() else {
            return Err(FrontierError::BlockComplete);
        };
        match auto_outline(vcs, grid, &first, name) {
            Ok(()) => {
                blocks.remove(0);
                let whole = SubBlock::whole(grid);
                if first.len1 == whole.len1 && first.len2 == whole.len2 {
                    return Ok(());
                }
                let mut discovered = find_frontier_blocks(vcs, grid, whole)?;
                discovered.retain(|b| !(b.len1 == first.len1 && b.len2 == first.len2));
                *blocks = normalize(discovered);
                if blocks.is_empty() {
                    return Err(FrontierError::BlockComplete);
                }
            }
            Err(FrontierError::UnexpectedMergeFailure { i1, i2 }) => {
                if (i1, i2) == (1, 1) {
                    grid.get_mut(1, 1).mark_blocked();
                }
                *blocks = remove_failure(std::mem::take(blocks), i1, i2);
                if blocks.is_empty() {
                    return Err(FrontierError::FrontierBlocked { i1, i2 });
                }
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_frontier_is_complete_only_when_apex_known() {
        let mut grid = Grid::new(2, 2);
        assert!(!MergeFrontier::Full.is_complete(&grid));
        grid.get_mut(2, 2).record_auto(test_oid(1));
        assert!(MergeFrontier::Full.is_complete(&grid));
    }

    #[test]
    fn blockwise_complete_requires_single_whole_block() {
        let grid = Grid::new(3, 3);
        let partial = MergeFrontier::Blockwise(vec![SubBlock { start1: 0, start2: 0, len1: 2, len2: 2 }]);
        assert!(!partial.is_complete(&grid));
        let whole =
            MergeFrontier::Blockwise(vec![SubBlock { start1: 0, start2: 0, len1: 4, len2: 4 }]);
        assert!(whole.is_complete(&grid));
    }

    fn test_oid(b: u8) -> imerge_grid::Oid {
        git_hash::ObjectId::from_bytes(&[b; 20], git_hash::HashAlgorithm::Sha1).unwrap()
    }
}
