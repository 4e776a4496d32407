//! RegionReader trait for format-agnostic slide access.
//!
//! A region reader turns a rectangle of the full-resolution slide into pixels
//! at a requested resolution. Decoding and resampling belong to the reader;
//! the pyramid code only decides which region to ask for.
//!
//! Reader levels follow the slide convention: level 0 is full resolution and
//! higher levels are progressively smaller.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;

use crate::error::{PyramidError, ReadError};
use crate::pyramid::TileRegion;

// =============================================================================
// Padding and Interpolation
// =============================================================================

/// How pixels outside the slide are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PadMode {
    /// Fill with zeros (black)
    #[default]
    Constant,

    /// Replicate the nearest edge pixel
    Edge,

    /// Mirror the image at its border (without repeating the edge pixel)
    Reflect,

    /// Do not pad: the returned image is cropped to the slide
    None,
}

impl PadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PadMode::Constant => "constant",
            PadMode::Edge => "edge",
            PadMode::Reflect => "reflect",
            PadMode::None => "none",
        }
    }
}

impl FromStr for PadMode {
    type Err = PyramidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "constant" | "zero" => Ok(PadMode::Constant),
            "edge" => Ok(PadMode::Edge),
            "reflect" => Ok(PadMode::Reflect),
            "none" => Ok(PadMode::None),
            other => Err(PyramidError::Config(format!("unsupported pad mode '{}'", other))),
        }
    }
}

impl fmt::Display for PadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resampling filter requested from the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Let the reader choose based on the scale factor
    #[default]
    Optimise,
    Nearest,
    Linear,
    Cubic,
    Lanczos,
    Area,
}

impl Interpolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Optimise => "optimise",
            Interpolation::Nearest => "nearest",
            Interpolation::Linear => "linear",
            Interpolation::Cubic => "cubic",
            Interpolation::Lanczos => "lanczos",
            Interpolation::Area => "area",
        }
    }
}

impl FromStr for Interpolation {
    type Err = PyramidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimise" | "optimize" => Ok(Interpolation::Optimise),
            "nearest" => Ok(Interpolation::Nearest),
            "linear" => Ok(Interpolation::Linear),
            "cubic" => Ok(Interpolation::Cubic),
            "lanczos" => Ok(Interpolation::Lanczos),
            "area" => Ok(Interpolation::Area),
            other => Err(PyramidError::Config(format!(
                "unsupported interpolation '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Region Request
// =============================================================================

/// Parameters of a single region read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRequest {
    /// Top-left corner in full-resolution pixels (may be negative)
    pub origin: (f64, f64),

    /// Output image size in pixels
    pub size: (u32, u32),

    /// Output resolution relative to full resolution (0.5 = half size)
    pub resolution: f64,

    pub pad_mode: PadMode,

    pub interpolation: Interpolation,
}

impl RegionRequest {
    /// Build the request for a tile region.
    pub fn from_region(
        region: &TileRegion,
        pad_mode: PadMode,
        interpolation: Interpolation,
    ) -> Self {
        Self {
            origin: region.origin,
            size: region.output_size,
            resolution: region.resolution(),
            pad_mode,
            interpolation,
        }
    }

    /// Downsample factor relative to full resolution.
    pub fn downsample(&self) -> f64 {
        1.0 / self.resolution
    }

    /// Check that the request can be served at all.
    pub fn validate(&self) -> Result<(), ReadError> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(ReadError::InvalidRequest(format!(
                "output size must be non-zero, got {}x{}",
                self.size.0, self.size.1
            )));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(ReadError::InvalidRequest(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !(self.origin.0.is_finite() && self.origin.1.is_finite()) {
            return Err(ReadError::InvalidRequest("origin must be finite".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// RegionReader Trait
// =============================================================================

/// Format-agnostic interface for reading regions from Whole Slide Images.
///
/// # Contract
///
/// - `read_region` returns exactly `request.size` pixels unless the pad mode
///   is [`PadMode::None`], in which case the out-of-slide part is cropped.
/// - Padding and interpolation modes are applied as given; callers never
///   reinterpret them.
/// - Implementations should run blocking decode work off the async executor
///   (e.g. with `tokio::task::spawn_blocking`).
#[async_trait]
pub trait RegionReader: Send + Sync {
    /// Dimensions of the full-resolution (level 0) image.
    fn dimensions(&self) -> (u32, u32);

    /// Number of resolution levels the reader stores.
    ///
    /// Level 0 is always full resolution.
    fn level_count(&self) -> usize;

    /// Read a region of the slide, resampled to `request.size`.
    async fn read_region(&self, request: &RegionRequest) -> Result<RgbImage, ReadError>;

    /// Read a whole reader level.
    ///
    /// The last level (`level_count() - 1`) is the cheapest full-slide view
    /// and backs overview thumbnails.
    async fn read_level(&self, level: usize) -> Result<RgbImage, ReadError>;
}

#[async_trait]
impl<T: RegionReader + ?Sized> RegionReader for Arc<T> {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn level_count(&self) -> usize {
        (**self).level_count()
    }

    async fn read_region(&self, request: &RegionRequest) -> Result<RgbImage, ReadError> {
        (**self).read_region(request).await
    }

    async fn read_level(&self, level: usize) -> Result<RgbImage, ReadError> {
        (**self).read_level(level).await
    }
}

// =============================================================================
// Level Selection
// =============================================================================

/// Find the best reader level for a requested downsample.
///
/// Given the reader's level downsamples (level 0 = 1.0, higher levels =
/// larger downsamples), returns the level with the largest downsample that
/// does not exceed `downsample` (so no upscaling is needed), together with
/// the additional scale still to apply.
pub fn best_level_for_downsample(
    level_downsamples: &[f64],
    downsample: f64,
) -> Option<(usize, f64)> {
    if level_downsamples.is_empty() {
        return None;
    }

    let mut best_level = 0;
    let mut best_downsample = level_downsamples[0];

    for (level, &level_downsample) in level_downsamples.iter().enumerate() {
        if level_downsample <= downsample && level_downsample >= best_downsample {
            best_level = level;
            best_downsample = level_downsample;
        }
    }

    Some((best_level, downsample / best_downsample))
}
