use derive_more::{Display, From};

use crate::types::Value;

pub type Result<T> = core::result::Result<T, MetaballError>;

#[derive(Debug, Display, From)]
pub enum MetaballError {
    /// The grid needs at least two cells per axis.
    #[display("resolution must be greater than 1, got {_0}")]
    InvalidResolution(u32),
    /// Half extent (or side length) was zero, negative or not finite.
    #[display("grid extent must be positive and finite, got {_0}")]
    InvalidExtent(Value),
    #[display("metaball handle {index} is out of range ({len} metaballs)")]
    HandleOutOfRange { index: usize, len: usize },
    #[display("sample buffer has the wrong shape: {_0}")]
    #[from]
    Shape(ndarray::ShapeError),
}

impl std::error::Error for MetaballError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetaballError::Shape(err) => Some(err),
            _ => None,
        }
    }
}
