use std::{fmt, sync::Arc};

use crate::types::{Point, Value, Vector};

/// A user supplied falloff: maps a ball `center` and a sample `point` to a field contribution.
///
/// Implemented for every `Fn(&Point, &Point) -> Value + Send + Sync`, so closures work directly:
///
/// ```rust,ignore
/// let ring = Shape::custom(|c: &Point, p: &Point| 1.0 / ((c - p).norm() - 1.0).abs());
/// ```
pub trait ScalarShape: Send + Sync {
    fn evaluate(&self, center: &Point, point: &Point) -> Value;
}

impl<F> ScalarShape for F
where
    F: Fn(&Point, &Point) -> Value + Send + Sync,
{
    #[inline]
    fn evaluate(&self, center: &Point, point: &Point) -> Value {
        self(center, point)
    }
}

/// Shared, type-erased [`ScalarShape`].
#[derive(Clone)]
pub struct CustomShape(pub Arc<dyn ScalarShape>);

impl fmt::Debug for CustomShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomShape(..)")
    }
}

/// Falloff function of a metaball.
///
/// Every formula below uses `d = center - point`.
#[derive(Debug, Clone)]
pub enum Shape {
    /// `scale / (w.x dx² + w.y dy² + w.z dz²)`: the classic inverse-square blob.
    Blob { scale: Value, weights: Vector },
    /// `scale / (w.x dx⁴ + w.y dy⁴ + w.z dz⁴ + eps)`: a rounded cube.
    Cube { scale: Value, weights: Vector, eps: Value },
    /// `exp(-|d|² / 2σ²)`.
    Gaussian { variance: Value },
    /// `n · d + offset`: a half space, positive on the side `n` points away from.
    Plane { normal: Vector, offset: Value },
    /// `a.x sin(x)cos(y) + a.y sin(y)cos(z) + a.z sin(z)cos(x)` in world coordinates.
    /// The center is ignored.
    Gyroid { amplitudes: Vector },
    /// `w.x / dx² + w.y / dy² + w.z / dz²`: three infinite slabs crossing at the center.
    Cross { weights: Vector },
    /// `scale / |dx dy|`.
    Star { scale: Value },
    /// `|thickness / ((a.x dx)² + (a.y dz)² + a.z dy)|`.
    Paraboloid { axes: Vector, thickness: Value },
    Custom(CustomShape),
}

impl Default for Shape {
    fn default() -> Self {
        Self::inverse_square()
    }
}

impl Shape {
    /// `1 / |c - p|²`; the isosurface at value `v` is a sphere of radius `1 / sqrt(v)`.
    pub fn inverse_square() -> Self {
        Self::blob(1.0, Vector::repeat(1.0))
    }

    pub fn blob(scale: Value, weights: Vector) -> Self {
        Self::Blob { scale, weights }
    }

    pub fn cube(scale: Value, weights: Vector, eps: Value) -> Self {
        Self::Cube { scale, weights, eps }
    }

    pub fn gaussian(variance: Value) -> Self {
        Self::Gaussian { variance }
    }

    pub fn plane(normal: Vector, offset: Value) -> Self {
        Self::Plane { normal, offset }
    }

    pub fn gyroid(amplitudes: Vector) -> Self {
        Self::Gyroid { amplitudes }
    }

    pub fn cross(weights: Vector) -> Self {
        Self::Cross { weights }
    }

    pub fn star(scale: Value) -> Self {
        Self::Star { scale }
    }

    pub fn paraboloid(axes: Vector, thickness: Value) -> Self {
        Self::Paraboloid { axes, thickness }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Point, &Point) -> Value + Send + Sync + 'static,
    {
        Self::Custom(CustomShape(Arc::new(f)))
    }

    /// Unsigned contribution of a ball centered at `center` to the field at `point`.
    #[inline]
    pub fn evaluate(&self, center: &Point, point: &Point) -> Value {
        let d = center - point;
        match self {
            Shape::Blob { scale, weights } => scale / weights.dot(&d.component_mul(&d)),
            Shape::Cube { scale, weights, eps } => {
                let d2 = d.component_mul(&d);
                scale / (weights.dot(&d2.component_mul(&d2)) + eps)
            }
            Shape::Gaussian { variance } => (-d.norm_squared() / (2.0 * variance)).exp(),
            Shape::Plane { normal, offset } => normal.dot(&d) + offset,
            Shape::Gyroid { amplitudes } => {
                let (x, y, z) = (point.x, point.y, point.z);
                amplitudes.x * x.sin() * y.cos()
                    + amplitudes.y * y.sin() * z.cos()
                    + amplitudes.z * z.sin() * x.cos()
            }
            Shape::Cross { weights } => {
                weights.x / (d.x * d.x) + weights.y / (d.y * d.y) + weights.z / (d.z * d.z)
            }
            Shape::Star { scale } => scale / (d.x * d.y).abs(),
            Shape::Paraboloid { axes, thickness } => {
                let u = axes.x * d.x;
                let w = axes.y * d.z;
                (thickness / (u * u + w * w + axes.z * d.y)).abs()
            }
            Shape::Custom(CustomShape(f)) => f.evaluate(center, point),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn inverse_square_matches_distance() {
        let s = Shape::inverse_square();
        let c = Point::new(1.0, 0.0, 0.0);
        assert_relative_eq!(s.evaluate(&c, &Point::new(3.0, 0.0, 0.0)), 0.25);
        assert_relative_eq!(s.evaluate(&c, &Point::new(1.0, 1.0, 1.0)), 0.5);
    }

    #[test]
    fn blob_at_center_is_infinite() {
        let c = Point::origin();
        assert!(Shape::inverse_square().evaluate(&c, &c).is_infinite());
    }

    #[test]
    fn cube_is_flatter_than_blob_along_axes() {
        let c = Point::origin();
        let cube = Shape::cube(1.0, Vector::repeat(1.0), 0.0);
        assert_relative_eq!(cube.evaluate(&c, &Point::new(0.5, 0.0, 0.0)), 16.0);
        assert_relative_eq!(cube.evaluate(&c, &Point::new(0.5, 0.5, 0.0)), 8.0);
    }

    #[test]
    fn gaussian_peaks_at_one() {
        let c = Point::new(2.0, 2.0, 2.0);
        let g = Shape::gaussian(0.5);
        assert_relative_eq!(g.evaluate(&c, &c), 1.0);
        assert_relative_eq!(g.evaluate(&c, &Point::new(3.0, 2.0, 2.0)), (-1.0f32).exp());
    }

    #[test]
    fn plane_is_signed_distance_plus_offset() {
        let p = Shape::plane(Vector::y(), 1.0);
        let c = Point::origin();
        assert_relative_eq!(p.evaluate(&c, &Point::new(5.0, -2.0, 7.0)), 3.0);
        assert_relative_eq!(p.evaluate(&c, &Point::new(0.0, 1.0, 0.0)), 0.0);
    }

    #[test]
    fn gyroid_ignores_center() {
        let g = Shape::gyroid(Vector::repeat(1.0));
        let p = Point::new(0.3, 1.1, -0.7);
        assert_eq!(
            g.evaluate(&Point::origin(), &p),
            g.evaluate(&Point::new(9.0, 9.0, 9.0), &p)
        );
    }

    #[test]
    fn gyroid_sums_three_sine_cosine_terms() {
        let g = Shape::gyroid(Vector::new(1.0, 2.0, 3.0));
        let p = Point::new(1.0, 2.0, -1.0);
        // sin(1)cos(2) + 2 sin(2)cos(-1) + 3 sin(-1)cos(1)
        let v = g.evaluate(&Point::new(0.5, 0.0, 0.0), &p);
        assert_relative_eq!(v, -0.731_530_6, epsilon = 1e-5);
    }

    #[test]
    fn cross_weights_each_axis_separately() {
        // d = (-0.5, -2, 1): 0.1 / 0.25 + 0.2 / 4 + 0.3 / 1
        let s = Shape::cross(Vector::new(0.1, 0.2, 0.3));
        let v = s.evaluate(&Point::new(0.5, 0.0, 0.0), &Point::new(1.0, 2.0, -1.0));
        assert_relative_eq!(v, 0.75, epsilon = 1e-6);
        assert!(s.evaluate(&Point::origin(), &Point::new(0.0, 1.0, 1.0)).is_infinite());
    }

    #[test]
    fn star_ignores_z() {
        let s = Shape::star(2.0);
        let c = Point::new(0.5, 0.0, 0.0);
        assert_relative_eq!(s.evaluate(&c, &Point::new(1.0, 2.0, -1.0)), 2.0);
        assert_relative_eq!(s.evaluate(&c, &Point::new(1.0, 2.0, 40.0)), 2.0);
    }

    #[test]
    fn paraboloid_is_quadratic_in_x_and_z_linear_in_y() {
        // d = (-0.5, -2, 1): |3 / ((1 * -0.5)² + (2 * 1)² + 3 * -2)| = 3 / 1.75
        let s = Shape::paraboloid(Vector::new(1.0, 2.0, 3.0), 3.0);
        let v = s.evaluate(&Point::new(0.5, 0.0, 0.0), &Point::new(1.0, 2.0, -1.0));
        assert_relative_eq!(v, 3.0 / 1.75, epsilon = 1e-5);

        // Swapping the y and z offsets changes the value.
        let swapped = s.evaluate(&Point::new(0.5, 0.0, 0.0), &Point::new(1.0, -1.0, 2.0));
        assert!((swapped - v).abs() > 0.1);
    }

    #[test]
    fn custom_closure_is_called() {
        let s = Shape::custom(|c: &Point, p: &Point| (c - p).norm());
        assert_relative_eq!(s.evaluate(&Point::origin(), &Point::new(3.0, 4.0, 0.0)), 5.0);
    }
}
