use crate::{
    config::EngineConfig,
    error::{MetaballError, Result},
    field::ScalarField,
    grid::SampleGrid,
    march::run_marching_cubes,
    mesh::MeshData,
    metaball::{Metaball, MetaballHandle},
    shape::Shape,
    types::{Point, Value, Vector, Vertex},
};

/// Owns a metaball field, the grid it is sampled on, and the mesh extracted from it.
///
/// The mesh is cached: it is rebuilt by [`refresh`](MetaballEngine::refresh) only while the
/// engine is dirty.
///
/// ```text
/// add/subtract_metaball ─┐
/// set_isovalue (changed) ├─► dirty ──refresh()──► clean ──refresh()──► clean (cached)
/// advance (moved)        │
/// make_dirty             ┘
/// ```
///
/// Mutating a ball through [`get_metaball_mut`](MetaballEngine::get_metaball_mut) does **not**
/// mark the engine dirty. Call [`make_dirty`](MetaballEngine::make_dirty) afterwards.
#[derive(Debug, Clone)]
pub struct MetaballEngine {
    grid: SampleGrid,
    field: ScalarField,
    isovalue: Value,
    config: EngineConfig,
    is_dirty: bool,
    active_samples: usize,
    mesh: MeshData,
}

impl MetaballEngine {
    /// Creates an engine sampling a cube of side `side_length` centered on `center`, with
    /// `resolution` cells per axis.
    ///
    /// Fails if `resolution <= 1` or `side_length` is not a positive, finite number.
    pub fn new(center: Point, side_length: Value, resolution: u32, isovalue: Value) -> Result<Self> {
        if !side_length.is_finite() || side_length <= 0.0 {
            return Err(MetaballError::InvalidExtent(side_length));
        }
        Ok(Self {
            grid: SampleGrid::new(center, side_length / 2.0, resolution)?,
            field: ScalarField::new(),
            isovalue,
            config: EngineConfig::default(),
            is_dirty: true,
            active_samples: 0,
            mesh: MeshData::new_empty(),
        })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self.is_dirty = true;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adds a positive metaball. The returned handle stays valid for the engine's lifetime.
    pub fn add_metaball(&mut self, center: Point, shape: Shape) -> MetaballHandle {
        self.is_dirty = true;
        self.field.add_metaball(center, shape)
    }

    /// Adds a metaball whose contribution is subtracted from the field.
    pub fn subtract_metaball(&mut self, center: Point, shape: Shape) -> MetaballHandle {
        self.is_dirty = true;
        self.field.subtract_metaball(center, shape)
    }

    /// Adds a fully configured metaball (sign, velocity).
    pub fn push_metaball(&mut self, ball: Metaball) -> MetaballHandle {
        self.is_dirty = true;
        self.field.push(ball)
    }

    pub fn get_metaball(&self, handle: MetaballHandle) -> Result<&Metaball> {
        self.field.get(handle)
    }

    /// Mutable access for animation. Does not mark the engine dirty.
    pub fn get_metaball_mut(&mut self, handle: MetaballHandle) -> Result<&mut Metaball> {
        self.field.get_mut(handle)
    }

    pub fn metaballs(&self) -> &[Metaball] {
        self.field.metaballs()
    }

    pub fn make_dirty(&mut self) -> &mut Self {
        self.is_dirty = true;
        self
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Sets the isovalue; the engine only becomes dirty if the value actually changed.
    pub fn set_isovalue(&mut self, isovalue: Value) -> &mut Self {
        self.is_dirty = self.is_dirty || isovalue != self.isovalue;
        self.isovalue = isovalue;
        self
    }

    pub fn isovalue(&self) -> Value {
        self.isovalue
    }

    /// Moves every kinetic ball by `velocity * dt`, marking the engine dirty if any moved.
    pub fn advance(&mut self, dt: Value) -> &mut Self {
        if self.field.advance(dt) {
            self.is_dirty = true;
        }
        self
    }

    /// Field value at `point`.
    pub fn evaluate(&self, point: &Point) -> Value {
        self.field.evaluate(point)
    }

    /// Outward surface normal at `point`, using the configured finite-difference step.
    pub fn normal(&self, point: &Point) -> Vector {
        self.field.normal(point, self.config.normal_epsilon)
    }

    /// Resamples the field on the grid. Returns the number of samples at or above the isovalue.
    ///
    /// Does not touch the mesh or the dirty flag.
    pub fn update_densities(&mut self) -> usize {
        let parallel = self.config.parallel;
        self.active_samples = self.grid.update_densities(&self.field, self.isovalue, parallel);
        self.active_samples
    }

    /// Rebuilds the mesh if the engine is dirty, then returns it.
    ///
    /// A rebuild always re-evaluates the whole grid and replaces the previous mesh.
    #[doc(alias = "construct_mesh")]
    pub fn refresh(&mut self) -> &MeshData {
        if !self.is_dirty {
            tracing::trace!("metaball mesh is clean, returning cached data");
            return &self.mesh;
        }

        let _span = tracing::debug_span!(
            "refresh",
            resolution = self.grid.resolution(),
            metaballs = self.field.len(),
        )
        .entered();

        self.is_dirty = false;
        let active = self.update_densities();
        run_marching_cubes(
            &self.grid,
            &self.field,
            self.isovalue,
            &self.config,
            active,
            &mut self.mesh,
        );

        tracing::debug!(
            active_samples = active,
            vertices = self.mesh.vertices.len(),
            triangles = self.mesh.triangle_count(),
            "rebuilt metaball mesh"
        );
        &self.mesh
    }

    /// The last built mesh, which may be stale if the engine is dirty.
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.mesh.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.mesh.indices
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    /// Samples at or above the isovalue as of the last density update.
    pub fn active_samples(&self) -> usize {
        self.active_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MetaballEngine {
        MetaballEngine::new(Point::origin(), 4.0, 16, 1.0).unwrap()
    }

    #[test]
    fn starts_dirty_and_refresh_cleans() {
        let mut e = engine();
        assert!(e.is_dirty());
        e.add_metaball(Point::origin(), Shape::inverse_square());
        assert!(!e.refresh().is_empty());
        assert!(!e.is_dirty());
    }

    #[test]
    fn set_isovalue_only_dirties_on_change() {
        let mut e = engine();
        e.refresh();
        e.set_isovalue(1.0);
        assert!(!e.is_dirty());
        e.set_isovalue(2.0);
        assert!(e.is_dirty());
        assert_eq!(e.isovalue(), 2.0);
    }

    #[test]
    fn mutation_paths_mark_dirty() {
        let mut e = engine();
        let h = e.add_metaball(Point::origin(), Shape::inverse_square());
        e.refresh();

        e.get_metaball_mut(h).unwrap().center.x = 0.5;
        assert!(!e.is_dirty());
        e.make_dirty();
        assert!(e.is_dirty());
        e.refresh();

        e.subtract_metaball(Point::new(1.0, 0.0, 0.0), Shape::gaussian(0.1));
        assert!(e.is_dirty());
        e.refresh();

        e.advance(0.1);
        assert!(!e.is_dirty());
        e.push_metaball(Metaball::new(Point::origin(), Shape::inverse_square()).with_velocity(Vector::x()));
        e.refresh();
        e.advance(0.1);
        assert!(e.is_dirty());
    }

    #[test]
    fn invalid_construction_is_an_error() {
        assert!(matches!(
            MetaballEngine::new(Point::origin(), 2.0, 1, 1.0),
            Err(MetaballError::InvalidResolution(1))
        ));
        assert!(matches!(
            MetaballEngine::new(Point::origin(), -2.0, 8, 1.0),
            Err(MetaballError::InvalidExtent(_))
        ));
    }

    #[test]
    fn out_of_range_handle_is_an_error() {
        let mut e = engine();
        let h = e.add_metaball(Point::origin(), Shape::inverse_square());
        let mut other = engine();
        assert!(other.get_metaball(h).is_err());
        assert!(other.get_metaball_mut(h).is_err());
        assert!(e.get_metaball(h).is_ok());
    }

    #[test]
    fn empty_engine_builds_empty_mesh() {
        let mut e = engine();
        let mesh = e.refresh();
        assert!(mesh.is_empty());
        assert!(mesh.indices.is_empty());
        assert_eq!(e.active_samples(), 0);
    }
}
