use crate::{
    shape::Shape,
    types::{Point, Value, Vector},
};

/// Whether a metaball adds to or carves away from the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    #[inline]
    pub fn factor(self) -> Value {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

/// Stable index of a metaball inside a [`ScalarField`](crate::field::ScalarField).
///
/// Metaballs are never removed one by one, so a handle stays valid for the lifetime of its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaballHandle(pub(crate) usize);

impl MetaballHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A signed falloff source. Move it by writing [`center`](Metaball::center), or give it a
/// [`velocity`](Metaball::velocity) and let [`advance`](Metaball::advance) integrate it.
#[derive(Debug, Clone)]
pub struct Metaball {
    pub sign: Sign,
    pub center: Point,
    /// World units per second. Zero for static balls.
    pub velocity: Vector,
    pub shape: Shape,
}

impl Metaball {
    pub fn new(center: Point, shape: Shape) -> Self {
        Self {
            sign: Sign::Positive,
            center,
            velocity: Vector::zeros(),
            shape,
        }
    }

    pub fn with_sign(mut self, sign: Sign) -> Self {
        self.sign = sign;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    /// Signed contribution of this ball at `point`.
    #[inline]
    pub fn evaluate(&self, point: &Point) -> Value {
        self.sign.factor() * self.shape.evaluate(&self.center, point)
    }

    pub fn is_kinetic(&self) -> bool {
        self.velocity != Vector::zeros()
    }

    /// Moves the center by `velocity * dt`. Returns `true` if the ball moved.
    pub fn advance(&mut self, dt: Value) -> bool {
        if !self.is_kinetic() || dt == 0.0 {
            return false;
        }
        self.center += self.velocity * dt;
        true
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn negative_sign_flips_contribution() {
        let p = Point::new(0.0, 2.0, 0.0);
        let ball = Metaball::new(Point::origin(), Shape::inverse_square());
        assert_relative_eq!(ball.evaluate(&p), 0.25);
        assert_relative_eq!(ball.with_sign(Sign::Negative).evaluate(&p), -0.25);
    }

    #[test]
    fn advance_integrates_velocity() {
        let mut ball = Metaball::new(Point::origin(), Shape::inverse_square())
            .with_velocity(Vector::new(1.0, -2.0, 0.5));
        assert!(ball.advance(0.5));
        assert_relative_eq!(ball.center, Point::new(0.5, -1.0, 0.25));
    }

    #[test]
    fn static_ball_does_not_move() {
        let mut ball = Metaball::new(Point::new(1.0, 1.0, 1.0), Shape::gaussian(1.0));
        assert!(!ball.advance(10.0));
        assert_eq!(ball.center, Point::new(1.0, 1.0, 1.0));
    }
}
