use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector3};

/// Scalar field value at a point in space.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// One output vertex: position followed by normal, 24 bytes, ready for a GPU vertex buffer.
///
/// ```text
/// offset  0: position.x position.y position.z
/// offset 12: normal.x   normal.y   normal.z
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [Value; 3],
    pub normal: [Value; 3],
}

const _: () = assert!(std::mem::size_of::<Vertex>() == 24);

impl Vertex {
    pub fn new(position: Point, normal: Vector) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            normal: [normal.x, normal.y, normal.z],
        }
    }

    pub fn position(&self) -> Point {
        Point::from(self.position)
    }

    pub fn normal(&self) -> Vector {
        Vector::from(self.normal)
    }
}
