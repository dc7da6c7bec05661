//! Terrain height buffer mutated by the adversary.

pub mod error;
pub mod height_field;

pub use error::TerrainError;
pub use height_field::{ClampResult, HeightField, STRIP_ROWS};
