/// Dense row-major cell store. State 0 is background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Grid {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    cells: Vec<u8>,
}

impl Grid {
    pub(crate) fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    pub(crate) fn idx(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    pub(crate) fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[self.idx(x, y)]
    }

    pub(crate) fn set(&mut self, x: usize, y: usize, state: u8) {
        let i = self.idx(x, y);
        self.cells[i] = state;
    }

    /// Row-major `(x, y, state)` for every cell.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &s)| (i % cols, i / cols, s))
    }

    /// New grid of the given size; the overlapping top-left region keeps its
    /// states, everything else starts at 0.
    pub(crate) fn resized(&self, rows: usize, cols: usize) -> Self {
        let mut out = Self::new(rows, cols);
        let keep_rows = self.rows.min(rows);
        let keep_cols = self.cols.min(cols);
        for y in 0..keep_rows {
            let src = self.idx(0, y);
            let dst = out.idx(0, y);
            out.cells[dst..dst + keep_cols].copy_from_slice(&self.cells[src..src + keep_cols]);
        }
        out
    }

    pub(crate) fn count_nonzero(&self) -> usize {
        self.cells.iter().filter(|&&s| s != 0).count()
    }
}

pub(crate) fn wrap_add(v: usize, delta: isize, max: usize) -> usize {
    (v as isize + delta).rem_euclid(max as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_background() {
        let g = Grid::new(3, 4);
        assert_eq!(g.count_nonzero(), 0);
        assert_eq!(g.iter().count(), 12);
    }

    #[test]
    fn iter_is_row_major() {
        let mut g = Grid::new(2, 3);
        g.set(2, 1, 7);
        let hit: Vec<_> = g.iter().filter(|c| c.2 != 0).collect();
        assert_eq!(hit, vec![(2, 1, 7)]);
        assert_eq!(g.iter().nth(3), Some((0, 1, 0)));
    }

    #[test]
    fn grow_preserves_overlap_and_zero_fills() {
        let mut g = Grid::new(2, 2);
        g.set(0, 0, 1);
        g.set(1, 0, 2);
        g.set(0, 1, 3);
        g.set(1, 1, 4);

        let big = g.resized(3, 4);
        assert_eq!(big.get(0, 0), 1);
        assert_eq!(big.get(1, 0), 2);
        assert_eq!(big.get(0, 1), 3);
        assert_eq!(big.get(1, 1), 4);
        for (x, y, s) in big.iter() {
            if x >= 2 || y >= 2 {
                assert_eq!(s, 0, "({x},{y}) should be fresh");
            }
        }
    }

    #[test]
    fn shrink_keeps_top_left() {
        let mut g = Grid::new(4, 5);
        for (i, y) in (0..4).enumerate() {
            for x in 0..5 {
                g.set(x, y, (i * 5 + x) as u8);
            }
        }
        let small = g.resized(2, 3);
        assert_eq!((small.rows, small.cols), (2, 3));
        for (x, y, s) in small.iter() {
            assert_eq!(s, g.get(x, y));
        }
    }

    #[test]
    fn wrap_add_is_toroidal() {
        assert_eq!(wrap_add(0, -1, 5), 4);
        assert_eq!(wrap_add(4, 1, 5), 0);
        assert_eq!(wrap_add(2, 1, 5), 3);
    }
}
