use imerge_grid::{Grid, Oid, SubBlock};
use imerge_vcs::{Vcs, VcsError};

use crate::error::FrontierError;

/// Complete the outline of a rectangle believed (by `find_frontier_blocks`)
/// to be entirely mergeable (§4.4): fill its bottom row and right column by
/// chaining merges outward from the known left/top edges, then finalize the
/// vertex two independent ways and accept it only if both trees agree.
///
/// Nothing is written into `grid` until every merge in the block has
/// succeeded — a failure partway through leaves the grid untouched, so the
/// caller can shrink the block and retry without having to undo anything.
pub fn auto_outline(
    vcs: &mut dyn Vcs,
    grid: &mut Grid,
    block: &SubBlock,
    name: &str,
) -> Result<(), FrontierError> {
    let len1 = block.len1;
    let len2 = block.len2;
    let mut merges: Vec<(usize, usize, Oid)> = Vec::new();

    let mut do_merge = |vcs: &mut dyn Vcs,
                         i1: usize,
                         commit1: Oid,
                         i2: usize,
                         commit2: Oid,
                         record: bool|
     -> Result<Oid, FrontierError> {
        if block.is_known(grid, i1, i2) {
            return Ok(block.get(grid, i1, i2).sha1.expect("is_known"));
        }
        let (gi1, gi2) = block.translate(i1, i2);
        let log_msg = format!("imerge '{name}': automatic merge {gi1}-{gi2}");
        match vcs.auto_merge(&commit1, &commit2, Some(&log_msg)) {
            Ok(oid) => {
                if record {
                    merges.push((i1, i2, oid));
                }
                Ok(oid)
            }
            Err(VcsError::AutomaticMergeFailed { .. }) => {
                Err(FrontierError::UnexpectedMergeFailure { i1: gi1, i2: gi2 })
            }
            Err(e) => Err(FrontierError::Vcs(e)),
        }
    };

    // Bottom edge: row i1, fixed at the block's last column, chained
    // outward from the top-right corner.
    let bottom_i2 = len2 - 1;
    let mut left = block.get(grid, 0, bottom_i2).sha1.expect("top edge known");
    for i1 in 1..len1 - 1 {
        let column_boundary = block.get(grid, i1, 0).sha1.expect("left edge known");
        left = do_merge(vcs, i1, column_boundary, bottom_i2, left, true)?;
    }

    // Right edge: column i2, fixed at the block's last row, chained
    // outward from the bottom-left corner.
    let right_i1 = len1 - 1;
    let mut above = block.get(grid, right_i1, 0).sha1.expect("left edge known");
    for i2 in 1..len2 - 1 {
        let row_boundary = block.get(grid, 0, i2).sha1.expect("top edge known");
        above = do_merge(vcs, right_i1, above, i2, row_boundary, true)?;
    }

    let (i1, i2) = (len1 - 1, len2 - 1);
    if i1 > 1 && i2 > 1 {
        let column_boundary = block.get(grid, i1, 0).sha1.expect("left edge known");
        let row_boundary = block.get(grid, 0, i2).sha1.expect("top edge known");
        let vertex_v1 = do_merge(vcs, i1, column_boundary, i2, left, false)?;
        let vertex_v2 = do_merge(vcs, i1, above, i2, row_boundary, false)?;
        let tree1 = vcs.get_tree(&vertex_v1)?;
        let tree2 = vcs.get_tree(&vertex_v2)?;
        if tree1 == tree2 {
            let reparented = vcs.reparent(&vertex_v1, &[above, left], None)?;
            merges.push((i1, i2, reparented));
        } else {
            return Err(FrontierError::InconsistentVertex {
                i1: block.translate(i1, i2).0,
                i2: block.translate(i1, i2).1,
                left_tree: tree1,
                right_tree: tree2,
            });
        }
    } else {
        let merge = do_merge(vcs, i1, above, i2, left, true)?;
        let _ = merge;
    }

    for (i1, i2, oid) in merges {
        block.get_mut(grid, i1, i2).record_auto(oid);
    }
    Ok(())
}
