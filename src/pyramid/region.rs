//! Mapping from tile addresses to source regions.

use crate::error::PyramidError;

use super::geometry::{PyramidGeometry, TileAddress};

/// The full-resolution window that must be resampled to render one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRegion {
    /// Top-left corner in full-resolution pixels. Negative when the overlap
    /// extends past the left or top edge of the image.
    pub origin: (f64, f64),

    /// Size of the rendered tile in pixels
    pub output_size: (u32, u32),

    /// Downsample factor of the tile's level
    pub downsample: f64,
}

impl TileRegion {
    /// Requested resolution relative to full resolution (`1 / downsample`).
    pub fn resolution(&self) -> f64 {
        1.0 / self.downsample
    }
}

impl PyramidGeometry {
    /// Compute the source region for the tile at `address`.
    ///
    /// The window is shifted outward by `overlap` on every side (scaled to
    /// full resolution), so edge tiles partly cover pixels outside the image;
    /// the region reader pads those.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::LevelOutOfRange`] for an unknown level
    /// - [`PyramidError::TileOutOfRange`] when the window origin lies beyond
    ///   the image on both axes
    pub fn tile_region(&self, address: TileAddress) -> Result<TileRegion, PyramidError> {
        let scale = self.level_downsample(address.level)?;
        let spec = self.spec();

        let tile_size = f64::from(spec.tile_size());
        let overlap = f64::from(spec.overlap());
        let origin_x = f64::from(address.x) * tile_size * scale - overlap * scale;
        let origin_y = f64::from(address.y) * tile_size * scale - overlap * scale;

        let (base_width, base_height) = spec.base_dimensions();
        if f64::from(base_width) < origin_x && f64::from(base_height) < origin_y {
            return Err(PyramidError::TileOutOfRange {
                level: address.level,
                x: address.x,
                y: address.y,
            });
        }

        let output = spec.output_tile_size();
        Ok(TileRegion {
            origin: (origin_x, origin_y),
            output_size: (output, output),
            downsample: scale,
        })
    }
}
