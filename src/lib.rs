//! Metaball scalar fields, sampled on a dense cubic grid and polygonised with Marching Cubes.
//!
//! ```rust,ignore
//! use marching_metaballs::prelude::*;
//!
//! let mut engine = MetaballEngine::new(Point::origin(), 4.0, 40, 1.0)?;
//! let ball = engine.add_metaball(Point::origin(), Shape::inverse_square());
//! engine.subtract_metaball(Point::new(0.8, 0.0, 0.0), Shape::gaussian(0.05));
//!
//! let mesh = engine.refresh();
//! upload(mesh.vertex_bytes(), mesh.index_bytes());
//!
//! engine.get_metaball_mut(ball)?.center.y += 0.1;
//! engine.make_dirty().refresh();
//! ```

pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod field;
pub mod grid;
pub mod interp;
pub mod march;
pub mod mesh;
pub mod metaball;
#[cfg(feature = "bevy")]
pub mod plugin;
pub mod shape;
pub mod tables;
pub mod types;

pub use engine::MetaballEngine;
#[cfg(feature = "bevy")]
pub use plugin::MetaballsPlugin;

pub mod prelude {
    pub use crate::{
        config::{EdgePolicy, EngineConfig},
        engine::MetaballEngine,
        error::MetaballError,
        mesh::MeshData,
        metaball::{Metaball, MetaballHandle, Sign},
        shape::Shape,
        types::{Point, Value, Vector, Vertex},
    };
}
