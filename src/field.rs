use crate::{
    error::{MetaballError, Result},
    metaball::{Metaball, MetaballHandle, Sign},
    shape::Shape,
    types::{Point, Value, Vector},
};

/// The sum of every metaball's signed contribution.
#[derive(Debug, Clone, Default)]
pub struct ScalarField {
    balls: Vec<Metaball>,
}

impl ScalarField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `ball` and returns its handle.
    pub fn push(&mut self, ball: Metaball) -> MetaballHandle {
        let handle = MetaballHandle(self.balls.len());
        self.balls.push(ball);
        handle
    }

    pub fn add_metaball(&mut self, center: Point, shape: Shape) -> MetaballHandle {
        self.push(Metaball::new(center, shape))
    }

    pub fn subtract_metaball(&mut self, center: Point, shape: Shape) -> MetaballHandle {
        self.push(Metaball::new(center, shape).with_sign(Sign::Negative))
    }

    pub fn get(&self, handle: MetaballHandle) -> Result<&Metaball> {
        let len = self.balls.len();
        self.balls
            .get(handle.0)
            .ok_or(MetaballError::HandleOutOfRange { index: handle.0, len })
    }

    pub fn get_mut(&mut self, handle: MetaballHandle) -> Result<&mut Metaball> {
        let len = self.balls.len();
        self.balls
            .get_mut(handle.0)
            .ok_or(MetaballError::HandleOutOfRange { index: handle.0, len })
    }

    pub fn metaballs(&self) -> &[Metaball] {
        &self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    /// Field value at `point`. An empty field evaluates to `0.0` everywhere.
    #[inline]
    pub fn evaluate(&self, point: &Point) -> Value {
        self.balls.iter().map(|ball| ball.evaluate(point)).sum()
    }

    /// Central-difference gradient of the whole field at `p` with step `eps`.
    pub fn gradient(&self, p: &Point, eps: Value) -> Vector {
        let dx = Vector::x() * eps;
        let dy = Vector::y() * eps;
        let dz = Vector::z() * eps;
        Vector::new(
            self.evaluate(&(p + dx)) - self.evaluate(&(p - dx)),
            self.evaluate(&(p + dy)) - self.evaluate(&(p - dy)),
            self.evaluate(&(p + dz)) - self.evaluate(&(p - dz)),
        ) / (2.0 * eps)
    }

    /// Outward surface normal at `p`.
    ///
    /// Metaball fields grow towards the inside, so this is the normalized, negated gradient.
    /// Returns the zero vector where the gradient vanishes.
    pub fn normal(&self, p: &Point, eps: Value) -> Vector {
        -self
            .gradient(p, eps)
            .try_normalize(0.0)
            .unwrap_or_else(Vector::zeros)
    }

    /// Integrates every kinetic ball forward by `dt`. Returns `true` if anything moved.
    pub fn advance(&mut self, dt: Value) -> bool {
        self.balls
            .iter_mut()
            .fold(false, |moved, ball| ball.advance(dt) || moved)
    }
}
