//! Pyramid parameters.
//!
//! A [`PyramidSpec`] fixes everything the tile geometry depends on: the
//! full-resolution image size, the tile size, the per-side overlap and the
//! downsample factor between consecutive levels. It is validated once at
//! construction and never changes afterwards.

use crate::error::PyramidError;

/// Default tile size (without overlap) for generic and Zoomify pyramids.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default downsample factor between consecutive levels.
pub const DEFAULT_DOWNSAMPLE: u32 = 2;

// =============================================================================
// Tile Parameters
// =============================================================================

/// Caller-chosen tiling parameters.
///
/// The base image dimensions are not part of this struct: they come from the
/// region reader when a generator is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileParams {
    /// Tile edge length in pixels, excluding overlap
    pub tile_size: u32,

    /// Extra pixels added on every side of a tile
    pub overlap: u32,

    /// Downsample factor between consecutive levels
    pub downsample: u32,
}

impl TileParams {
    pub const fn new(tile_size: u32, overlap: u32, downsample: u32) -> Self {
        Self {
            tile_size,
            overlap,
            downsample,
        }
    }

    /// Edge length of a rendered tile: `tile_size + 2 * overlap`.
    pub const fn output_tile_size(&self) -> u32 {
        self.tile_size + 2 * self.overlap
    }
}

impl Default for TileParams {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE, 0, DEFAULT_DOWNSAMPLE)
    }
}

// =============================================================================
// Pyramid Spec
// =============================================================================

/// Immutable description of a tile pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PyramidSpec {
    base_width: u32,
    base_height: u32,
    params: TileParams,
}

impl PyramidSpec {
    /// Create a spec for a `base_width` x `base_height` image.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::InvalidSpec`] if a base dimension or the tile
    /// size is zero, or if the downsample factor is below 1.
    pub fn new(
        base_width: u32,
        base_height: u32,
        params: TileParams,
    ) -> Result<Self, PyramidError> {
        if base_width == 0 || base_height == 0 {
            return Err(PyramidError::InvalidSpec(format!(
                "base dimensions must be non-zero, got {}x{}",
                base_width, base_height
            )));
        }
        if params.tile_size == 0 {
            return Err(PyramidError::InvalidSpec(
                "tile_size must be greater than 0".to_string(),
            ));
        }
        if params.downsample < 1 {
            return Err(PyramidError::InvalidSpec(
                "downsample must be at least 1".to_string(),
            ));
        }
        params
            .tile_size
            .checked_add(params.overlap.saturating_mul(2))
            .ok_or_else(|| PyramidError::InvalidSpec("tile_size + 2 * overlap overflows".into()))?;

        Ok(Self {
            base_width,
            base_height,
            params,
        })
    }

    pub fn base_width(&self) -> u32 {
        self.base_width
    }

    pub fn base_height(&self) -> u32 {
        self.base_height
    }

    /// Full-resolution `(width, height)`.
    pub fn base_dimensions(&self) -> (u32, u32) {
        (self.base_width, self.base_height)
    }

    pub fn tile_size(&self) -> u32 {
        self.params.tile_size
    }

    pub fn overlap(&self) -> u32 {
        self.params.overlap
    }

    pub fn downsample(&self) -> u32 {
        self.params.downsample
    }

    pub fn params(&self) -> TileParams {
        self.params
    }

    pub fn output_tile_size(&self) -> u32 {
        self.params.output_tile_size()
    }

    /// Number of tile-bearing levels: `ceil(log2(max_dim / tile_size)) + 1`,
    /// never less than 1.
    ///
    /// Computed as the smallest `k` with `tile_size * 2^k >= max_dim`, plus
    /// one, which avoids floating point rounding at exact powers of two.
    pub fn base_level_count(&self) -> u32 {
        let max_dim = u64::from(self.base_width.max(self.base_height));
        let mut covered = u64::from(self.params.tile_size);
        let mut levels = 1;
        while covered < max_dim {
            covered *= 2;
            levels += 1;
        }
        levels
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `ceil(log2(n))` for `n >= 1`; 0 for `n <= 1`.
pub fn ceil_log2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        u32::BITS - (n - 1).leading_zeros()
    }
}
