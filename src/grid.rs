use std::ops::{Index, IndexMut};

/// Row-major dense 2D array with exclusive ownership of its storage.
///
/// An index `(x, y)` is valid iff `x < width && y < height`. Direct indexing
/// panics on out-of-bounds access; neighborhood scans that may step outside
/// the grid use [`Grid::get_or`] with signed coordinates instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            Some(&self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Bounds-tolerant read for neighborhood scans: returns `oob` for any
    /// coordinate outside the grid.
    pub fn get_or(&self, x: i64, y: i64, oob: T) -> T
    where
        T: Copy,
    {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize]
        } else {
            oob
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        &mut self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Grow or shrink the grid, preserving the overlapping top-left region
    /// and filling any new cells with `fill`.
    pub fn resize(&mut self, width: usize, height: usize, fill: T) {
        if width == self.width && height == self.height {
            return;
        }
        let mut next = Grid::new(width, height, fill);
        let cw = width.min(self.width);
        let ch = height.min(self.height);
        for y in 0..ch {
            next.row_mut(y)[..cw].clone_from_slice(&self.row(y)[..cw]);
        }
        *self = next;
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        debug_assert!(x < self.width && y < self.height);
        &self.cells[y * self.width + x]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        debug_assert!(x < self.width && y < self.height);
        &mut self.cells[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        let mut g = Grid::new(4, 3, 0u8);
        g[(3, 2)] = 7;
        g[(0, 0)] = 1;
        assert_eq!(g[(3, 2)], 7);
        assert_eq!(g[(0, 0)], 1);
        assert_eq!(g[(1, 1)], 0);
    }

    #[test]
    fn test_get_bounds() {
        let g = Grid::new(2, 2, 5u8);
        assert_eq!(g.get(1, 1), Some(&5));
        assert_eq!(g.get(2, 1), None);
        assert_eq!(g.get(1, 2), None);
    }

    #[test]
    fn test_get_or_oob() {
        let g = Grid::new(2, 2, 5u8);
        assert_eq!(g.get_or(0, 0, 9), 5);
        assert_eq!(g.get_or(-1, 0, 9), 9);
        assert_eq!(g.get_or(0, 2, 9), 9);
        assert_eq!(g.get_or(i64::MAX, 0, 9), 9);
    }

    #[test]
    fn test_resize_preserves_top_left() {
        let mut g = Grid::new(3, 3, 0u8);
        for y in 0..3 {
            for x in 0..3 {
                g[(x, y)] = (y * 3 + x) as u8;
            }
        }
        g.resize(5, 2, 99);
        assert_eq!(g.width(), 5);
        assert_eq!(g.height(), 2);
        // preserved overlap
        assert_eq!(g[(0, 0)], 0);
        assert_eq!(g[(2, 1)], 5);
        // new cells get the fill value
        assert_eq!(g[(3, 0)], 99);
        assert_eq!(g[(4, 1)], 99);
    }

    #[test]
    fn test_resize_noop() {
        let mut g = Grid::new(2, 2, 1u8);
        g[(1, 0)] = 3;
        g.resize(2, 2, 0);
        assert_eq!(g[(1, 0)], 3);
    }

    #[test]
    fn test_rows() {
        let mut g = Grid::new(3, 2, 0u32);
        g.row_mut(1).copy_from_slice(&[4, 5, 6]);
        assert_eq!(g.row(0), &[0, 0, 0]);
        assert_eq!(g.row(1), &[4, 5, 6]);
        assert_eq!(g[(2, 1)], 6);
    }
}
