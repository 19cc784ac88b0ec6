use crate::{
    config::EdgePolicy,
    types::{Point, Value},
};

// Clamp `d` away from zero, keeping its sign
#[inline]
fn clamp_denominator(d: Value, floor: Value) -> Value {
    if d.abs() < floor { floor.copysign(d) } else { d }
}

// Return the interpolation factor t corresponding to iso_val
//
// The denominator magnitude never drops below `floor`, so two nearly equal samples
// cannot blow t up to infinity. t may still leave [0, 1] in that case.
#[inline]
pub fn find_t(v0: Value, v1: Value, iso_val: Value, floor: Value) -> Value {
    (iso_val - v0) / clamp_denominator(v1 - v0, floor)
}

// Linear interpolation
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// Linearly interpolate between two points by factor t
#[inline]
pub fn interpolate_points(p0: &Point, p1: &Point, t: Value) -> Point {
    Point::new(
        lerp(p0.x, p1.x, t),
        lerp(p0.y, p1.y, t),
        lerp(p0.z, p1.z, t),
    )
}

/// Finds where the isosurface crosses the edge `p0 -> p1`, given the field values at both ends.
#[inline]
pub fn edge_crossing(
    (p0, v0): (&Point, Value),
    (p1, v1): (&Point, Value),
    iso_val: Value,
    floor: Value,
    policy: EdgePolicy,
) -> Point {
    match policy {
        EdgePolicy::ClampDenominator => interpolate_points(p0, p1, find_t(v0, v1, iso_val, floor)),
        EdgePolicy::SnapToNearest => {
            if (v1 - v0).abs() < floor {
                // Flat edge: pick whichever end is closer to the isovalue.
                if (iso_val - v0).abs() <= (iso_val - v1).abs() { *p0 } else { *p1 }
            } else {
                interpolate_points(p0, p1, find_t(v0, v1, iso_val, floor))
            }
        }
    }
}
