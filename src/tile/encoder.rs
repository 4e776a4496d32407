//! Tile encoder.
//!
//! Rendered tiles are RGB rasters; this module turns them into file bytes.
//!
//! # Design Decisions
//!
//! - **Archives always hold JPEG**: tiles written to ZIP or TAR are JPEG
//!   encoded in memory regardless of the container's own compression.
//!
//! - **Directories follow the extension**: a tile written to a directory is
//!   encoded in the format its path extension names.
//!
//! - **Quality control**: JPEG quality is configurable per encoder.

use std::path::Path;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::PyramidError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Tile Format
// =============================================================================

/// On-disk encoding of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileFormat {
    Jpeg,
    Png,
}

impl TileFormat {
    /// Pick the encoding named by a path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::Config`] for a missing or unknown extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PyramidError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("jpg") | Some("jpeg") => Ok(TileFormat::Jpeg),
            Some("png") => Ok(TileFormat::Png),
            _ => Err(PyramidError::Config(format!(
                "cannot infer tile encoding from '{}'",
                path.display()
            ))),
        }
    }
}

// =============================================================================
// Tile Encoder
// =============================================================================

/// Encoder turning rendered tiles into file bytes.
///
/// # Example
///
/// ```
/// use image::RgbImage;
/// use wsi_pyramid::tile::{TileEncoder, TileFormat};
///
/// let encoder = TileEncoder::new(85);
/// let tile = RgbImage::new(256, 256);
/// let jpeg = encoder.encode(&tile, TileFormat::Jpeg).unwrap();
/// assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TileEncoder {
    quality: u8,
}

impl TileEncoder {
    /// Create an encoder; `quality` is clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `tile` in `format`.
    pub fn encode(&self, tile: &RgbImage, format: TileFormat) -> Result<Bytes, PyramidError> {
        let mut output = Vec::new();
        let (width, height) = tile.dimensions();

        let result = match format {
            TileFormat::Jpeg => JpegEncoder::new_with_quality(&mut output, self.quality)
                .write_image(tile.as_raw(), width, height, ExtendedColorType::Rgb8),
            TileFormat::Png => PngEncoder::new(&mut output).write_image(
                tile.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
        };
        result.map_err(|e| PyramidError::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}

impl Default for TileEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
///
/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
