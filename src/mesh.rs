use crate::types::{Point, Vertex};

/// Output of one rebuild: a triangle list ready for upload.
///
/// Vertices are never shared: every group of three consecutive vertices forms one triangle,
/// and `indices` is simply `0, 1, 2, ...`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Flat list of vertices, position then normal.
    pub vertices: Vec<Vertex>,

    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates an empty mesh with no vertices or indices.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Empties both buffers, keeping their allocations.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn reserve(&mut self, vertices: usize) {
        self.vertices.reserve(vertices);
        self.indices.reserve(vertices);
    }

    /// Appends one triangle.
    pub fn push_triangle(&mut self, tri: [Vertex; 3]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&tri);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Appends a flat vertex list (a multiple of 3) and indexes it sequentially.
    pub fn extend_triangles(&mut self, mut vertices: Vec<Vertex>) {
        debug_assert_eq!(vertices.len() % 3, 0);
        let base = self.vertices.len() as u32;
        self.indices.extend((0..vertices.len() as u32).map(|i| base + i));
        self.vertices.append(&mut vertices);
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn triangle(&self, tri: usize) -> Option<[Point; 3]> {
        let idx = self.indices.get(tri * 3..tri * 3 + 3)?;
        let mut corners = [Point::origin(); 3];
        for (corner, &i) in corners.iter_mut().zip(idx) {
            *corner = self.vertices.get(i as usize)?.position();
        }
        Some(corners)
    }

    /// Mean vertex position, or `None` for an empty mesh.
    pub fn centroid(&self) -> Option<Point> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Point::origin().coords, |acc, v| acc + v.position().coords);
        Some(Point::from(sum / self.vertices.len() as f32))
    }

    /// Vertex buffer as raw bytes (24 per vertex).
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes (4 per index).
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::types::Vector;

    fn vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Point::new(x, y, z), Vector::z())
    }

    #[test]
    fn triangles_are_indexed_sequentially() {
        let mut mesh = MeshData::new_empty();
        mesh.push_triangle([vertex(0.0, 0.0, 0.0), vertex(1.0, 0.0, 0.0), vertex(0.0, 1.0, 0.0)]);
        mesh.extend_triangles(vec![
            vertex(0.0, 0.0, 1.0),
            vertex(1.0, 0.0, 1.0),
            vertex(0.0, 1.0, 1.0),
        ]);

        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(
            mesh.triangle(1),
            Some([Point::new(0.0, 0.0, 1.0), Point::new(1.0, 0.0, 1.0), Point::new(0.0, 1.0, 1.0)])
        );
        assert_eq!(mesh.triangle(2), None);
    }

    #[test]
    fn centroid_averages_positions() {
        let mut mesh = MeshData::new_empty();
        assert_eq!(mesh.centroid(), None);
        mesh.push_triangle([vertex(0.0, 0.0, 0.0), vertex(3.0, 0.0, 0.0), vertex(0.0, 3.0, 3.0)]);
        assert_relative_eq!(mesh.centroid().unwrap(), Point::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn byte_views_match_gpu_layout() {
        let mut mesh = MeshData::new_empty();
        mesh.push_triangle([vertex(1.0, 2.0, 3.0), vertex(0.0, 0.0, 0.0), vertex(0.0, 0.0, 0.0)]);
        assert_eq!(mesh.vertex_bytes().len(), 3 * 24);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
        assert_eq!(&mesh.vertex_bytes()[4..8], &2.0f32.to_ne_bytes());
        assert_eq!(&mesh.vertex_bytes()[20..24], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut mesh = MeshData::new_empty();
        mesh.reserve(30);
        mesh.push_triangle([Vertex::default(); 3]);
        mesh.clear();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.capacity() >= 30);
    }
}
