use std::ops::Range;

use crate::{
    grid::{SampleGrid, SamplePoint},
    tables::CORNER_OFFSETS,
    types::{Point, Value},
};

/// Borrowed view of one cell: the 2×2×2 block of samples starting at `origin`.
///
/// Corners are addressed `0..8` in the order of [`CORNER_OFFSETS`], which is the order the
/// lookup tables expect. Nothing is copied; every access goes back to the grid.
#[derive(Debug, Clone, Copy)]
pub struct CellView<'a> {
    grid: &'a SampleGrid,
    origin: [usize; 3],
}

impl<'a> CellView<'a> {
    /// Lattice coordinates of corner 0.
    pub fn origin(&self) -> [usize; 3] {
        self.origin
    }

    /// Lattice coordinates of `corner`.
    #[inline]
    pub fn corner_coords(&self, corner: usize) -> [usize; 3] {
        let [ox, oy, oz] = CORNER_OFFSETS[corner];
        [self.origin[0] + ox, self.origin[1] + oy, self.origin[2] + oz]
    }

    /// Linear sample index of `corner`.
    #[inline]
    pub fn index(&self, corner: usize) -> usize {
        let [x, y, z] = self.corner_coords(corner);
        self.grid.compactor().flatten(x, y, z)
    }

    /// Sample at `corner` (`0..8`).
    ///
    /// # Panics
    /// Panics if `corner >= 8`.
    #[inline]
    pub fn at(&self, corner: usize) -> &'a SamplePoint {
        let grid: &'a SampleGrid = self.grid;
        match grid.sample(self.index(corner)) {
            Some(sample) => sample,
            // Cells are only built by `CellRange`, which keeps origin + 1 inside the lattice.
            None => unreachable!("cell corner outside the sample grid"),
        }
    }

    pub fn corners(&self) -> [&'a SamplePoint; 8] {
        std::array::from_fn(|corner| self.at(corner))
    }

    pub fn densities(&self) -> [Value; 8] {
        std::array::from_fn(|corner| self.at(corner).density)
    }

    pub fn positions(&self) -> [Point; 8] {
        std::array::from_fn(|corner| self.at(corner).position)
    }
}

/// Lazy iterator over the cells of a [`SampleGrid`].
///
/// Yields `resolution³` cells x-fastest, then y, then z, the same order as
///
/// ```text
/// for z in 0..res { for y in 0..res { for x in 0..res { ... } } }
/// ```
#[derive(Debug, Clone)]
pub struct CellRange<'a> {
    grid: &'a SampleGrid,
    next: usize,
    end: usize,
}

impl<'a> CellRange<'a> {
    /// Every cell of `grid`.
    pub fn new(grid: &'a SampleGrid) -> Self {
        Self::slab(grid, 0..grid.resolution())
    }

    /// Only the cells whose origin lies in the z layers `z_range`.
    ///
    /// The range is clipped to the lattice.
    pub fn slab(grid: &'a SampleGrid, z_range: Range<usize>) -> Self {
        let res = grid.resolution();
        let layer = res * res;
        let end_z = z_range.end.min(res);
        let start_z = z_range.start.min(end_z);
        Self {
            grid,
            next: start_z * layer,
            end: end_z * layer,
        }
    }
}

impl<'a> Iterator for CellRange<'a> {
    type Item = CellView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let res = self.grid.resolution();
        let i = self.next;
        self.next += 1;
        Some(CellView {
            grid: self.grid,
            origin: [i % res, (i / res) % res, i / (res * res)],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRange<'_> {}

impl std::iter::FusedIterator for CellRange<'_> {}
