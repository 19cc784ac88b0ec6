use ndarray::Array3;

use crate::{
    cursor::CellRange,
    error::{MetaballError, Result},
    field::ScalarField,
    types::{Point, Value, Vector},
};

/// One lattice sample: a fixed position and the field value last computed there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub position: Point,
    pub density: Value,
}

/// Maps between a linear buffer index and `[x, y, z]` lattice coordinates.
///
/// Layout is x-fastest: `i = x + y * W + z * W * H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCompactor {
    dim: [usize; 3],
}

impl IndexCompactor {
    pub fn new(dim: [usize; 3]) -> Self {
        Self { dim }
    }

    /// Same extent along all three axes.
    pub fn cubic(n: usize) -> Self {
        Self::new([n; 3])
    }

    #[inline]
    pub fn flatten(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dim[0] + z * self.dim[0] * self.dim[1]
    }

    /// Linear stride contributed by `value` along `axis` (0 = x, 1 = y, 2 = z).
    #[inline]
    pub fn flatten_at(&self, value: usize, axis: usize) -> usize {
        match axis {
            0 => value,
            1 => value * self.dim[0],
            2 => value * self.dim[0] * self.dim[1],
            _ => 0,
        }
    }

    #[inline]
    pub fn unflatten(&self, i: usize) -> [usize; 3] {
        let [w, h, _] = self.dim;
        [i % w, (i / w) % h, i / (w * h)]
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dim
    }

    /// Number of addressable indices.
    pub fn len(&self) -> usize {
        self.dim.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, [x, y, z]: [usize; 3]) -> bool {
        x < self.dim[0] && y < self.dim[1] && z < self.dim[2]
    }
}

/// Cubic lattice of `(resolution + 1)³` samples centered on `center`.
///
/// Samples are stored `[z][y][x]` in a standard-layout [`Array3`], which is the same flat,
/// x-fastest buffer [`IndexCompactor`] describes.
///
/// ```text
///  axis index:   0 ...... mid ...... resolution
///  position:   c - h ...   c   ... c + h
/// ```
#[derive(Debug, Clone)]
pub struct SampleGrid {
    center: Point,
    half_extent: Value,
    resolution: usize,
    compactor: IndexCompactor,
    samples: Array3<SamplePoint>,
}

impl SampleGrid {
    /// Builds the lattice. Densities start at `0.0`.
    ///
    /// An odd `resolution` is lowered by one so a sample lands exactly on `center`.
    /// Returns [`MetaballError::InvalidResolution`] when `resolution <= 1`.
    pub fn new(center: Point, half_extent: Value, resolution: u32) -> Result<Self> {
        if resolution <= 1 {
            return Err(MetaballError::InvalidResolution(resolution));
        }
        if !half_extent.is_finite() || half_extent <= 0.0 {
            return Err(MetaballError::InvalidExtent(half_extent));
        }

        let even = resolution - (resolution & 1);
        if even != resolution {
            log::debug!("odd grid resolution {resolution} lowered to {even}");
        }

        let resolution = even as usize;
        let n = resolution + 1;
        let mid = (resolution / 2) as Value;
        let compactor = IndexCompactor::cubic(n);

        let samples: Vec<SamplePoint> = (0..compactor.len())
            .map(|i| {
                let [x, y, z] = compactor.unflatten(i);
                let ratio = Vector::new(x as Value - mid, y as Value - mid, z as Value - mid) / mid;
                SamplePoint {
                    position: center + ratio * half_extent,
                    density: 0.0,
                }
            })
            .collect();

        Ok(Self {
            center,
            half_extent,
            resolution,
            compactor,
            samples: Array3::from_shape_vec((n, n, n), samples)?,
        })
    }

    /// Recomputes every density from `field`.
    ///
    /// Returns how many samples are at or above `isovalue`, which only serves as a size hint
    /// for the output buffers.
    pub fn update_densities(&mut self, field: &ScalarField, isovalue: Value, parallel: bool) -> usize {
        let fill = |s: &mut SamplePoint| s.density = field.evaluate(&s.position);
        if parallel {
            self.samples.par_map_inplace(fill);
        } else {
            self.samples.map_inplace(fill);
        }
        self.samples.iter().filter(|s| s.density >= isovalue).count()
    }

    /// Cells per axis (always even).
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn samples_per_axis(&self) -> usize {
        self.resolution + 1
    }

    pub fn compactor(&self) -> IndexCompactor {
        self.compactor
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn half_extent(&self) -> Value {
        self.half_extent
    }

    /// Sample at linear index `i`.
    pub fn sample(&self, i: usize) -> Option<&SamplePoint> {
        let [x, y, z] = self.compactor.unflatten(i);
        self.samples.get([z, y, x])
    }

    /// Sample at lattice coordinates `[x, y, z]`.
    #[inline]
    pub fn sample_at(&self, [x, y, z]: [usize; 3]) -> Option<&SamplePoint> {
        self.samples.get([z, y, x])
    }

    /// All samples in buffer order.
    pub fn iter(&self) -> impl Iterator<Item = &SamplePoint> {
        self.samples.iter()
    }

    /// `[min, max]` corners of the sampled box.
    pub fn bounds(&self) -> [Point; 2] {
        let h = Vector::repeat(self.half_extent);
        [self.center - h, self.center + h]
    }

    /// Every cell of the lattice, x-fastest.
    pub fn cells(&self) -> CellRange<'_> {
        CellRange::new(self)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::shape::Shape;

    #[test]
    fn compactor_round_trip() {
        let c = IndexCompactor::new([3, 4, 5]);
        for z in 0..5 {
            for y in 0..4 {
                for x in 0..3 {
                    let i = c.flatten(x, y, z);
                    assert_eq!(c.unflatten(i), [x, y, z]);
                }
            }
        }
        for i in 0..c.len() {
            let [x, y, z] = c.unflatten(i);
            assert_eq!(c.flatten(x, y, z), i);
        }
    }

    #[test]
    fn flatten_at_matches_flatten() {
        let c = IndexCompactor::cubic(7);
        let i = c.flatten_at(2, 0) + c.flatten_at(3, 1) + c.flatten_at(4, 2);
        assert_eq!(i, c.flatten(2, 3, 4));
        assert_eq!(c.flatten_at(4, 3), 0);
    }

    #[test]
    fn center_sample_is_exact() {
        let grid = SampleGrid::new(Point::origin(), 5.0, 10).unwrap();
        assert_eq!(grid.samples_per_axis(), 11);
        assert_eq!(grid.sample_at([5, 5, 5]).unwrap().position, Point::origin());
        assert_eq!(grid.sample_at([0, 0, 0]).unwrap().position, Point::new(-5.0, -5.0, -5.0));
        assert_eq!(grid.sample_at([10, 10, 10]).unwrap().position, Point::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn grid_is_offset_by_center() {
        let c = Point::new(1.0, -2.0, 3.0);
        let grid = SampleGrid::new(c, 1.0, 4).unwrap();
        assert_eq!(grid.sample_at([2, 2, 2]).unwrap().position, c);
        assert_relative_eq!(grid.sample_at([3, 2, 0]).unwrap().position, Point::new(1.5, -2.0, 2.0));
        assert_eq!(grid.bounds(), [Point::new(0.0, -3.0, 2.0), Point::new(2.0, -1.0, 4.0)]);
    }

    #[test]
    fn linear_and_lattice_access_agree() {
        let grid = SampleGrid::new(Point::origin(), 1.0, 4).unwrap();
        let c = grid.compactor();
        let by_index = grid.sample(c.flatten(1, 2, 3)).unwrap();
        assert_eq!(by_index, grid.sample_at([1, 2, 3]).unwrap());
        // Buffer order is x-fastest.
        let third = grid.iter().nth(2).unwrap();
        assert_eq!(third, grid.sample_at([2, 0, 0]).unwrap());
        assert!(grid.sample(grid.len()).is_none());
    }

    #[test]
    fn odd_resolution_is_lowered() {
        let grid = SampleGrid::new(Point::origin(), 1.0, 11).unwrap();
        assert_eq!(grid.resolution(), 10);
        assert_eq!(grid.len(), 11 * 11 * 11);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(matches!(
            SampleGrid::new(Point::origin(), 1.0, 1),
            Err(MetaballError::InvalidResolution(1))
        ));
        assert!(SampleGrid::new(Point::origin(), 1.0, 0).is_err());
        assert!(matches!(
            SampleGrid::new(Point::origin(), 0.0, 8),
            Err(MetaballError::InvalidExtent(_))
        ));
        assert!(SampleGrid::new(Point::origin(), Value::NAN, 8).is_err());
    }

    #[test]
    fn update_densities_counts_active_samples() {
        let mut field = ScalarField::new();
        field.add_metaball(Point::origin(), Shape::plane(Vector::x(), 0.0));
        let mut grid = SampleGrid::new(Point::origin(), 1.0, 2).unwrap();

        // f = -x: the x = -1 and x = 0 layers are >= 0.
        let active = grid.update_densities(&field, 0.0, false);
        assert_eq!(active, 18);
        assert_eq!(grid.sample_at([0, 1, 1]).unwrap().density, 1.0);

        let mut parallel = grid.clone();
        assert_eq!(parallel.update_densities(&field, 0.0, true), 18);
        assert!(grid.iter().eq(parallel.iter()));
    }
}
