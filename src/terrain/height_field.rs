//! Clamped terrain height buffer.
//!
//! The buffer stores one sample per along-track segment, in height-map units
//! (`world height / scale_y`). Reads and writes speak world units. The strip
//! is two rows wide in the scene; both rows always carry the same samples.

use crate::config::TerrainConfig;

use super::error::TerrainError;

/// Number of height-map rows the 1-D buffer is extruded to.
pub const STRIP_ROWS: usize = 2;

/// Outcome of a [`HeightField::write`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampResult {
    /// Height actually stored, in world units.
    pub written_height: f64,
    /// True iff the requested height lay outside `[min_height, max_height]`.
    pub was_clamped: bool,
}

/// Terrain heights for the course window ahead of the walker.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    origin_index: usize,
    scale_y: f64,
    min_height: f64,
    max_height: f64,
    buffer: Vec<f64>,
}

impl HeightField {
    /// Allocates a field of `len` segments at the floor height.
    ///
    /// # Arguments
    ///
    /// * `origin_index` - Height-map column of segment 0
    /// * `len` - Number of writable segments
    /// * `scale_y` - World-height to height-map-unit factor
    /// * `min_height`, `max_height` - Clamp window in world units
    pub fn new(
        origin_index: usize,
        len: usize,
        scale_y: f64,
        min_height: f64,
        max_height: f64,
    ) -> Result<Self, TerrainError> {
        if len == 0 {
            return Err(TerrainError::EmptyCourse);
        }
        if !scale_y.is_finite() || scale_y <= 0.0 {
            return Err(TerrainError::InvalidScale(scale_y));
        }
        if !min_height.is_finite() || !max_height.is_finite() || min_height >= max_height {
            return Err(TerrainError::InvalidRange {
                min: min_height,
                max: max_height,
            });
        }
        Ok(Self {
            origin_index,
            scale_y,
            min_height,
            max_height,
            buffer: vec![min_height / scale_y; len],
        })
    }

    /// Allocates the course window for a walker starting at world x `start_x`.
    ///
    /// The window starts `lead_offset` meters behind the walker and spans
    /// `course_length` segments; it must fit inside the scene's height map.
    pub fn for_start(config: &TerrainConfig, start_x: f64) -> Result<Self, TerrainError> {
        let origin =
            ((start_x - config.lead_offset - config.origin_x) / config.segment_length).floor() as i64;
        let end = origin + config.course_length as i64;
        if origin < 0 || end > config.heightmap_width as i64 {
            return Err(TerrainError::OutsideHeightmap {
                origin,
                end,
                width: config.heightmap_width,
            });
        }
        Self::new(
            origin as usize,
            config.course_length,
            config.scale_y,
            config.min_height,
            config.max_height,
        )
    }

    /// Clamps `raw_height` (world units) into range and stores it at `index`.
    pub fn write(&mut self, index: usize, raw_height: f64) -> Result<ClampResult, TerrainError> {
        let len = self.buffer.len();
        let slot = self
            .buffer
            .get_mut(index)
            .ok_or(TerrainError::IndexOutOfRange { index, len })?;
        if raw_height.is_nan() {
            return Err(TerrainError::NonFiniteHeight(raw_height));
        }
        let written_height = raw_height.clamp(self.min_height, self.max_height);
        *slot = written_height / self.scale_y;
        Ok(ClampResult {
            written_height,
            was_clamped: written_height != raw_height,
        })
    }

    /// Height at `index`, in world units.
    pub fn read(&self, index: usize) -> Result<f64, TerrainError> {
        self.read_raw(index).map(|raw| raw * self.scale_y)
    }

    /// Height at `index`, in height-map units.
    pub fn read_raw(&self, index: usize) -> Result<f64, TerrainError> {
        self.buffer
            .get(index)
            .copied()
            .ok_or(TerrainError::IndexOutOfRange {
                index,
                len: self.buffer.len(),
            })
    }

    /// Resets every segment to `height` (clamped), e.g. a flat baseline.
    pub fn fill(&mut self, height: f64) -> Result<ClampResult, TerrainError> {
        if height.is_nan() {
            return Err(TerrainError::NonFiniteHeight(height));
        }
        let written_height = height.clamp(self.min_height, self.max_height);
        self.buffer.fill(written_height / self.scale_y);
        Ok(ClampResult {
            written_height,
            was_clamped: written_height != height,
        })
    }

    /// Raw samples for syncing into the physics height map.
    pub fn samples(&self) -> &[f64] {
        &self.buffer
    }

    /// The extruded strip: every row carries the same samples.
    pub fn strip_rows(&self) -> [&[f64]; STRIP_ROWS] {
        [self.buffer.as_slice(); STRIP_ROWS]
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    pub fn min_height(&self) -> f64 {
        self.min_height
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }
}
