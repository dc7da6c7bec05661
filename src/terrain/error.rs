use thiserror::Error;

/// Precondition violations on the terrain buffer.
///
/// All of these indicate a broken course setup; out-of-range heights are not
/// errors, they are clamped and reported through [`super::ClampResult`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    #[error("Height index {index} outside allocated course of {len} segments")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Course must contain at least one segment")]
    EmptyCourse,

    #[error("Height scale must be finite and positive, got {0}")]
    InvalidScale(f64),

    #[error("Invalid height range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("Height {0} is not a finite number")]
    NonFiniteHeight(f64),

    #[error("Course window [{origin}, {end}) does not fit a height map of width {width}")]
    OutsideHeightmap { origin: i64, end: i64, width: usize },
}
