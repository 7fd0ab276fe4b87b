use imerge_vcs::Oid;

use crate::cell::MergeRecord;

/// The (m+1)×(n+1) grid of cells, dense in memory, indexed `[i1][i2]` with
/// `0 <= i1 <= m`, `0 <= i2 <= n`.
#[derive(Debug, Clone)]
pub struct Grid {
    m: usize,
    n: usize,
    cells: Vec<MergeRecord>,
}

impl Grid {
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            cells: vec![MergeRecord::unknown(); (m + 1) * (n + 1)],
        }
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    fn index(&self, i1: usize, i2: usize) -> usize {
        debug_assert!(i1 <= self.m && i2 <= self.n, "({i1},{i2}) out of bounds");
        i1 * (self.n + 1) + i2
    }

    pub fn get(&self, i1: usize, i2: usize) -> &MergeRecord {
        &self.cells[self.index(i1, i2)]
    }

    pub fn get_mut(&mut self, i1: usize, i2: usize) -> &mut MergeRecord {
        let idx = self.index(i1, i2);
        &mut self.cells[idx]
    }

    pub fn is_known(&self, i1: usize, i2: usize) -> bool {
        self.get(i1, i2).is_known()
    }

    /// Find the grid coordinates of a known cell by its commit oid, scanning
    /// in row-major order. Used by the orchestrator to locate a user's merge
    /// commit's parents among recorded cells.
    pub fn find_index(&self, oid: &Oid) -> Option<(usize, usize)> {
        for i1 in 0..=self.m {
            for i2 in 0..=self.n {
                if self.get(i1, i2).sha1.as_ref() == Some(oid) {
                    return Some((i1, i2));
                }
            }
        }
        None
    }

    /// Iterate all `(i1, i2)` coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.n;
        (0..=self.m).flat_map(move |i1| (0..=n).map(move |i2| (i1, i2)))
    }

    /// The apex cell `M[m,n]`, representing the fully merged result.
    pub fn apex(&self) -> &MergeRecord {
        self.get(self.m, self.n)
    }
}

/// A rectangular view `[start1:start1+len1, start2:start2+len2]` over a
/// `Grid`. Per §9, views are never nested: `SubBlock::sub` flattens its
/// offsets against the base grid's coordinate space on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubBlock {
    pub start1: usize,
    pub start2: usize,
    pub len1: usize,
    pub len2: usize,
}

impl SubBlock {
    pub fn whole(grid: &Grid) -> Self {
        Self {
            start1: 0,
            start2: 0,
            len1: grid.m() + 1,
            len2: grid.n() + 1,
        }
    }

    /// Translate a local `(i1, i2)` (0-based within this view) to grid
    /// coordinates.
    pub fn translate(&self, i1: usize, i2: usize) -> (usize, usize) {
        (self.start1 + i1, self.start2 + i2)
    }

    /// A sub-view of this view, with offsets relative to it — flattened
    /// immediately against the base grid's coordinate space.
    pub fn sub(&self, start1: usize, start2: usize, len1: usize, len2: usize) -> Self {
        Self {
            start1: self.start1 + start1,
            start2: self.start2 + start2,
            len1,
            len2,
        }
    }

    pub fn get<'g>(&self, grid: &'g Grid, i1: usize, i2: usize) -> &'g MergeRecord {
        let (g1, g2) = self.translate(i1, i2);
        grid.get(g1, g2)
    }

    pub fn get_mut<'g>(&self, grid: &'g mut Grid, i1: usize, i2: usize) -> &'g mut MergeRecord {
        let (g1, g2) = self.translate(i1, i2);
        grid.get_mut(g1, g2)
    }

    pub fn is_known(&self, grid: &Grid, i1: usize, i2: usize) -> bool {
        self.get(grid, i1, i2).is_known()
    }

    /// Does this view contain `other` entirely (used by frontier
    /// normalization to drop redundant blocks)?
    pub fn contains(&self, other: &SubBlock) -> bool {
        self.start1 <= other.start1
            && self.start2 <= other.start2
            && self.start1 + self.len1 >= other.start1 + other.len1
            && self.start2 + self.len2 >= other.start2 + other.len2
    }

    pub fn area(&self) -> usize {
        self.len1 * self.len2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_hash::ObjectId;

    fn oid(b: u8) -> Oid {
        ObjectId::from_bytes(&[b; 20], git_hash::HashAlgorithm::Sha1).unwrap()
    }

    #[test]
    fn indexing_round_trips() {
        let mut grid = Grid::new(3, 4);
        grid.get_mut(2, 3).record_auto(oid(7));
        assert_eq!(grid.get(2, 3).sha1, Some(oid(7)));
        assert!(!grid.is_known(2, 2));
    }

    #[test]
    fn find_index_locates_known_cell() {
        let mut grid = Grid::new(2, 2);
        grid.get_mut(1, 1).record_manual(oid(9));
        assert_eq!(grid.find_index(&oid(9)), Some((1, 1)));
        assert_eq!(grid.find_index(&oid(1)), None);
    }

    #[test]
    fn subblock_flattens_nested_offsets() {
        let grid = Grid::new(10, 10);
        let whole = SubBlock::whole(&grid);
        let once = whole.sub(2, 3, 4, 4);
        let twice = once.sub(1, 1, 2, 2);
        assert_eq!(twice.start1, 3);
        assert_eq!(twice.start2, 4);
        assert_eq!(twice.translate(0, 0), (3, 4));
    }

    #[test]
    fn containment() {
        let outer = SubBlock { start1: 0, start2: 0, len1: 5, len2: 5 };
        let inner = SubBlock { start1: 1, start2: 1, len1: 2, len2: 2 };
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }
}
