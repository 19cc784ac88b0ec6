use crate::types::Value;

/// How an edge whose two samples are (almost) equal is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Clamp `|d1 - d0|` to at least [`EngineConfig::denominator_floor`], keeping its sign.
    ///
    /// The crossing point can land outside the edge when the isovalue is far from both samples.
    #[default]
    ClampDenominator,
    /// Below the floor, place the crossing on the corner whose value is nearer the isovalue.
    SnapToNearest,
}

/// Runtime configuration for a [`MetaballEngine`](crate::engine::MetaballEngine).
///
/// ```rust,ignore
/// let engine = MetaballEngine::new(Point::origin(), 4.0, 40, 1.0)?
///     .with_config(EngineConfig::default().with_parallel(false));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Step used for the central-difference gradient behind every vertex normal. Default: `1e-3`.
    pub normal_epsilon: Value,
    /// Smallest denominator magnitude allowed during edge interpolation. Default: `1e-6`.
    pub denominator_floor: Value,
    /// Degenerate-edge handling. Default: [`EdgePolicy::ClampDenominator`].
    pub edge_policy: EdgePolicy,
    /// Evaluate densities and triangulate with Rayon.
    ///
    /// Output order is the same either way. Default: `true`.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            normal_epsilon: 1e-3,
            denominator_floor: 1e-6,
            edge_policy: EdgePolicy::default(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn with_normal_epsilon(mut self, eps: Value) -> Self {
        self.normal_epsilon = eps;
        self
    }

    pub fn with_denominator_floor(mut self, floor: Value) -> Self {
        self.denominator_floor = floor;
        self
    }

    pub fn with_edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
