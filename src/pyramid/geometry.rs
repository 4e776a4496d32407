//! Per-level pyramid geometry.
//!
//! Level numbering runs from 0 (coarsest, the whole image in a single tile)
//! up to `level_count - 1` (full resolution). This is the reverse of the
//! region reader's convention, where level 0 is full resolution.

use crate::error::PyramidError;

use super::spec::PyramidSpec;

// =============================================================================
// Level Geometry
// =============================================================================

/// Geometry of a single pyramid level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelGeometry {
    /// Downsample factor relative to the full-resolution image
    pub downsample: f64,

    /// Width of this level in pixels
    pub width: u32,

    /// Height of this level in pixels
    pub height: u32,

    /// Number of tiles in X direction
    pub tiles_x: u32,

    /// Number of tiles in Y direction
    pub tiles_y: u32,
}

impl LevelGeometry {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn tile_grid(&self) -> (u32, u32) {
        (self.tiles_x, self.tiles_y)
    }

    pub fn tile_count(&self) -> u64 {
        u64::from(self.tiles_x) * u64::from(self.tiles_y)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.tiles_x && y < self.tiles_y
    }
}

// =============================================================================
// Tile Address
// =============================================================================

/// Position of a tile in the pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    /// Pyramid level (0 = coarsest)
    pub level: u32,

    /// Tile column (0-indexed from left)
    pub x: u32,

    /// Tile row (0-indexed from top)
    pub y: u32,
}

impl TileAddress {
    pub const fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }
}

// =============================================================================
// Pyramid Geometry
// =============================================================================

/// Geometry of every level of a pyramid.
///
/// All levels are computed once at construction; afterwards the struct is
/// read-only and can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct PyramidGeometry {
    spec: PyramidSpec,
    sub_tile_level_count: u32,
    levels: Vec<LevelGeometry>,
    /// Number of tiles in all levels before the indexed one
    level_offsets: Vec<u64>,
    total_tiles: u64,
}

impl PyramidGeometry {
    /// Compute the geometry for `spec`.
    ///
    /// `sub_tile_level_count` and `level_count_adjustment` come from the
    /// naming strategy; the level count is
    /// `base_level_count + sub_tile_level_count + level_count_adjustment`,
    /// but never less than 1.
    pub fn new(spec: PyramidSpec, sub_tile_level_count: u32, level_count_adjustment: i32) -> Self {
        let level_count = (i64::from(spec.base_level_count())
            + i64::from(sub_tile_level_count)
            + i64::from(level_count_adjustment))
        .max(1) as u32;

        let (base_width, base_height) = spec.base_dimensions();
        let factor = f64::from(spec.downsample());
        let tile_size = spec.tile_size();

        let mut levels = Vec::with_capacity(level_count as usize);
        let mut level_offsets = Vec::with_capacity(level_count as usize);
        let mut total_tiles = 0u64;

        for level in 0..level_count {
            let downsample = factor.powi((level_count - level - 1) as i32);
            let width = (f64::from(base_width) / downsample).ceil() as u32;
            let height = (f64::from(base_height) / downsample).ceil() as u32;
            let geometry = LevelGeometry {
                downsample,
                width,
                height,
                tiles_x: width.div_ceil(tile_size),
                tiles_y: height.div_ceil(tile_size),
            };

            level_offsets.push(total_tiles);
            total_tiles += geometry.tile_count();
            levels.push(geometry);
        }

        Self {
            spec,
            sub_tile_level_count: sub_tile_level_count.min(level_count),
            levels,
            level_offsets,
            total_tiles,
        }
    }

    /// Geometry without sub-tile levels or adjustments.
    pub fn generic(spec: PyramidSpec) -> Self {
        Self::new(spec, 0, 0)
    }

    pub fn spec(&self) -> &PyramidSpec {
        &self.spec
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    pub fn sub_tile_level_count(&self) -> u32 {
        self.sub_tile_level_count
    }

    /// Whether `level` is rendered from the overview thumbnail.
    pub fn is_sub_tile_level(&self, level: u32) -> bool {
        level < self.sub_tile_level_count
    }

    /// Geometry of `level`.
    pub fn level(&self, level: u32) -> Result<&LevelGeometry, PyramidError> {
        self.levels
            .get(level as usize)
            .ok_or(PyramidError::LevelOutOfRange {
                level,
                level_count: self.level_count(),
            })
    }

    pub fn levels(&self) -> &[LevelGeometry] {
        &self.levels
    }

    /// `downsample ^ (level_count - level - 1)`.
    pub fn level_downsample(&self, level: u32) -> Result<f64, PyramidError> {
        Ok(self.level(level)?.downsample)
    }

    /// `ceil(base_dimensions / level_downsample(level))`.
    pub fn level_dimensions(&self, level: u32) -> Result<(u32, u32), PyramidError> {
        Ok(self.level(level)?.dimensions())
    }

    /// `ceil(level_dimensions(level) / tile_size)`.
    pub fn tile_grid(&self, level: u32) -> Result<(u32, u32), PyramidError> {
        Ok(self.level(level)?.tile_grid())
    }

    /// Total number of tiles over all levels.
    pub fn tile_count(&self) -> u64 {
        self.total_tiles
    }

    /// Number of tiles in the levels before `level`.
    pub fn tiles_before(&self, level: u32) -> Result<u64, PyramidError> {
        self.level(level)?;
        Ok(self.level_offsets[level as usize])
    }

    /// Check that `address` lies inside its level's tile grid.
    pub fn validate(&self, address: TileAddress) -> Result<&LevelGeometry, PyramidError> {
        let level = self.level(address.level)?;
        if !level.contains(address.x, address.y) {
            return Err(PyramidError::TileOutOfRange {
                level: address.level,
                x: address.x,
                y: address.y,
            });
        }
        Ok(level)
    }

    /// Position of `address` in canonical enumeration order.
    pub fn global_index(&self, address: TileAddress) -> Result<u64, PyramidError> {
        let level = self.validate(address)?;
        let in_level = u64::from(address.y) * u64::from(level.tiles_x) + u64::from(address.x);
        Ok(self.level_offsets[address.level as usize] + in_level)
    }

    /// Iterate every tile address in canonical order: ascending level, then
    /// rows top to bottom, then columns left to right.
    pub fn addresses(&self) -> TileAddresses<'_> {
        TileAddresses {
            levels: &self.levels,
            next: Some(TileAddress::new(0, 0, 0)),
            remaining: self.total_tiles,
        }
    }
}

// =============================================================================
// Address Iterator
// =============================================================================

/// Lazy iterator over the tile addresses of a pyramid.
///
/// Cloning the iterator (or calling [`PyramidGeometry::addresses`] again)
/// restarts enumeration; no state is shared.
#[derive(Debug, Clone)]
pub struct TileAddresses<'a> {
    levels: &'a [LevelGeometry],
    next: Option<TileAddress>,
    remaining: u64,
}

impl Iterator for TileAddresses<'_> {
    type Item = TileAddress;

    fn next(&mut self) -> Option<TileAddress> {
        loop {
            let mut current = self.next?;
            let level = match self.levels.get(current.level as usize) {
                Some(level) => level,
                None => {
                    self.next = None;
                    return None;
                }
            };

            // Skip empty or exhausted levels
            if !level.contains(current.x, current.y) {
                self.next = Some(TileAddress::new(current.level + 1, 0, 0));
                continue;
            }

            let item = current;
            current.x += 1;
            if current.x >= level.tiles_x {
                current.x = 0;
                current.y += 1;
            }
            self.next = Some(current);
            self.remaining = self.remaining.saturating_sub(1);
            return Some(item);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
