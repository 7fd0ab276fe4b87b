use imerge_grid::{Grid, SubBlock};
use imerge_vcs::{Vcs, VcsError};

use crate::bisect::find_first_false;
use crate::mergeable::is_mergeable;

/// `find_frontier_blocks` (§4.3 point 4): produces a sequence of maximal
/// mergeable rectangles within `block`, bottom-left to top-right.
///
/// The two working assumptions (monotonicity of success/failure) make the
/// mergeable region within `block` a staircase: for a fixed row, mergeable
/// columns form a prefix; for a fixed column, mergeable rows form a prefix.
/// That lets the staircase be swept in O(len1+len2) bisections rather than
/// probing every cell: at each step the current row-extent `row_bound` is
/// known good up to the current column; bisecting along the bottom row of
/// that extent finds how far right it holds, then bisecting along that new
/// column finds the (necessarily smaller) row-extent for the next step.
pub fn find_frontier_blocks(
    vcs: &mut dyn Vcs,
    grid: &mut Grid,
    block: SubBlock,
) -> Result<Vec<SubBlock>, VcsError> {
    if block.len1 <= 1 || block.len2 <= 1 {
        return Ok(Vec::new());
    }
    if block.get(grid, 1, 1).blocked {
        return Ok(Vec::new());
    }
    if is_mergeable(vcs, grid, &block, block.len1 - 1, block.len2 - 1)? {
        return Ok(vec![block]);
    }
    if !is_mergeable(vcs, grid, &block, 1, 1)? {
        block.get_mut(grid, 1, 1).mark_blocked();
        return Ok(Vec::new());
    }

    let mut blocks = Vec::new();
    let mut row_bound = block.len1;
    let mut col_start = 1usize;
    while col_start < block.len2 && row_bound > 1 {
        let col_end = find_first_false(col_start, block.len2, |i2| {
            is_mergeable(vcs, &*grid, &block, row_bound - 1, i2)
        })?;
        if col_end > col_start {
            blocks.push(block.sub(0, col_start, row_bound, col_end - col_start));
        }
        if col_end >= block.len2 {
            break;
        }
        row_bound = find_first_false(1, row_bound, |i1| {
            is_mergeable(vcs, &*grid, &block, i1, col_end)
        })?;
        col_start = col_end;
    }
    Ok(blocks)
}

/// Renormalize a frontier's block list after a failure splits one of them
/// (§4.5): drop empty rectangles, drop any rectangle fully contained in
/// another, and sort bottom-left to top-right (by descending `len1`, which
/// is the order blocks are naturally discovered in by the sweep above).
pub fn normalize(mut blocks: Vec<SubBlock>) -> Vec<SubBlock> {
    blocks.retain(|b| b.len1 >= 1 && b.len2 >= 1);
    let mut kept: Vec<SubBlock> = Vec::new();
    'outer: for candidate in blocks {
        let mut i = 0;
        while i < kept.len() {
            if kept[i].contains(&candidate) {
                continue 'outer;
            }
            if candidate.contains(&kept[i]) {
                kept.remove(i);
                continue;
            }
            i += 1;
        }
        kept.push(candidate);
    }
    kept.sort_by(|a, b| b.len1.cmp(&a.len1).then(a.start2.cmp(&b.start2)));
    kept
}

/// Replace any block whose extent contains grid coordinate `(fi1, fi2)`
/// (translated into that block's local coordinates) with up to two proper
/// sub-rectangles `[:fi1,:]` and `[:,:fi2]` (§4.5), then renormalize. A
/// local offset of exactly 1 is skipped rather than emitted as a
/// degenerate length-1 (boundary-only) sub-rectangle.
pub fn remove_failure(blocks: Vec<SubBlock>, fi1: usize, fi2: usize) -> Vec<SubBlock> {
    let mut out = Vec::new();
    for b in blocks {
        let contains = fi1 >= b.start1
            && fi1 < b.start1 + b.len1
            && fi2 >= b.start2
            && fi2 < b.start2 + b.len2;
        if !contains {
            out.push(b);
            continue;
        }
        let local1 = fi1 - b.start1;
        let local2 = fi2 - b.start2;
        if local1 > 1 {
            out.push(b.sub(0, 0, local1, b.len2));
        }
        if local2 > 1 {
            out.push(b.sub(0, 0, b.len1, local2));
        }
    }
    normalize(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start1: usize, start2: usize, len1: usize, len2: usize) -> SubBlock {
        SubBlock { start1, start2, len1, len2 }
    }

    #[test]
    fn normalize_drops_contained_blocks() {
        let blocks = vec![block(0, 0, 5, 5), block(1, 1, 2, 2)];
        let normalized = normalize(blocks);
        assert_eq!(normalized, vec![block(0, 0, 5, 5)]);
    }

    #[test]
    fn normalize_drops_empty_blocks() {
        let blocks = vec![block(0, 0, 0, 3), block(0, 0, 3, 3)];
        let normalized = normalize(blocks);
        assert_eq!(normalized, vec![block(0, 0, 3, 3)]);
    }

    #[test]
    fn normalize_sorts_by_descending_len1() {
        let blocks = vec![block(0, 3, 2, 2), block(0, 0, 5, 3)];
        let normalized = normalize(blocks);
        assert_eq!(normalized[0].len1, 5);
        assert_eq!(normalized[1].len1, 2);
    }

    #[test]
    fn remove_failure_splits_containing_block() {
        let blocks = vec![block(0, 0, 6, 6)];
        let split = remove_failure(blocks, 3, 2);
        // [:3,:6] and [:6,:2], neither containing the other
        assert!(split.iter().any(|b| b.len1 == 3 && b.len2 == 6));
        assert!(split.iter().any(|b| b.len1 == 6 && b.len2 == 2));
        for a in &split {
            for b in &split {
                if a != b {
                    assert!(!a.contains(b));
                }
            }
        }
    }

    #[test]
    fn remove_failure_at_origin_drops_block_entirely() {
        let blocks = vec![block(0, 0, 6, 6)];
        let split = remove_failure(blocks, 0, 0);
        assert!(split.is_empty());
    }
}
