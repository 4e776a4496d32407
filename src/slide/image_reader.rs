//! Region reader backed by an in-memory raster.
//!
//! [`ImageRegionReader`] serves regions from a decoded image. On construction
//! it builds its own resolution chain by repeated halving, so reads at coarse
//! pyramid levels start from a small image instead of the full raster.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::debug;

use crate::error::ReadError;

use super::reader::{best_level_for_downsample, Interpolation, PadMode, RegionReader, RegionRequest};

/// Reader levels are halved until the longest edge fits within this size.
pub const DEFAULT_MAX_OVERVIEW_DIMENSION: u32 = 1024;

// =============================================================================
// Reader Levels
// =============================================================================

#[derive(Debug)]
struct ReaderLevel {
    image: RgbImage,
    downsample: f64,
}

fn build_levels(image: RgbImage, max_overview_dimension: u32) -> Vec<ReaderLevel> {
    let max_overview_dimension = max_overview_dimension.max(1);
    let mut levels = vec![ReaderLevel {
        image,
        downsample: 1.0,
    }];

    loop {
        let previous = &levels[levels.len() - 1];
        let (width, height) = previous.image.dimensions();
        if width.max(height) <= max_overview_dimension || width.min(height) < 2 {
            break;
        }

        let image = imageops::resize(
            &previous.image,
            width.div_ceil(2),
            height.div_ceil(2),
            FilterType::Triangle,
        );
        let downsample = previous.downsample * 2.0;
        levels.push(ReaderLevel { image, downsample });
    }

    levels
}

// =============================================================================
// Image Region Reader
// =============================================================================

/// [`RegionReader`] over a decoded RGB image.
///
/// Cloning is cheap: the level chain is shared.
#[derive(Debug, Clone)]
pub struct ImageRegionReader {
    levels: Arc<Vec<ReaderLevel>>,
}

impl ImageRegionReader {
    /// Create a reader with the default level chain.
    pub fn new(image: RgbImage) -> Self {
        Self::with_max_overview_dimension(image, DEFAULT_MAX_OVERVIEW_DIMENSION)
    }

    /// Create a reader whose coarsest level fits within
    /// `max_overview_dimension` pixels on its longest edge.
    pub fn with_max_overview_dimension(image: RgbImage, max_overview_dimension: u32) -> Self {
        Self {
            levels: Arc::new(build_levels(image, max_overview_dimension)),
        }
    }

    /// Decode an image file (any format enabled in the `image` crate).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(io) => {
                ReadError::Io(format!("{}: {}", path.display(), io))
            }
            other => ReadError::Decode(format!("{}: {}", path.display(), other)),
        })?;
        Ok(Self::new(image.to_rgb8()))
    }

    /// Downsample factor of every reader level, level 0 first.
    pub fn level_downsamples(&self) -> Vec<f64> {
        self.levels.iter().map(|level| level.downsample).collect()
    }
}

#[async_trait]
impl RegionReader for ImageRegionReader {
    fn dimensions(&self) -> (u32, u32) {
        self.levels[0].image.dimensions()
    }

    fn level_count(&self) -> usize {
        self.levels.len()
    }

    async fn read_region(&self, request: &RegionRequest) -> Result<RgbImage, ReadError> {
        request.validate()?;

        let levels = Arc::clone(&self.levels);
        let request = *request;
        tokio::task::spawn_blocking(move || extract_region(&levels, &request))
            .await
            .map_err(|e| ReadError::Io(format!("region worker failed: {}", e)))?
    }

    async fn read_level(&self, level: usize) -> Result<RgbImage, ReadError> {
        self.levels
            .get(level)
            .map(|l| l.image.clone())
            .ok_or(ReadError::InvalidLevel {
                level,
                level_count: self.levels.len(),
            })
    }
}

// =============================================================================
// Region Extraction
// =============================================================================

fn extract_region(levels: &[ReaderLevel], request: &RegionRequest) -> Result<RgbImage, ReadError> {
    let downsamples: Vec<f64> = levels.iter().map(|level| level.downsample).collect();
    let (index, extra_scale) = best_level_for_downsample(&downsamples, request.downsample())
        .ok_or_else(|| ReadError::InvalidRequest("reader has no levels".to_string()))?;
    let level = &levels[index];

    // Source window in the chosen level's pixels
    let x0 = (request.origin.0 / level.downsample).floor() as i64;
    let y0 = (request.origin.1 / level.downsample).floor() as i64;
    let window_width = (f64::from(request.size.0) * extra_scale).ceil().max(1.0) as u32;
    let window_height = (f64::from(request.size.1) * extra_scale).ceil().max(1.0) as u32;

    debug!(
        origin_x = request.origin.0,
        origin_y = request.origin.1,
        width = request.size.0,
        height = request.size.1,
        reader_level = index,
        window_width,
        window_height,
        x0,
        y0,
        "Reading region"
    );

    if request.pad_mode == PadMode::None {
        let (width, height) = level.image.dimensions();
        let left = x0.max(0);
        let top = y0.max(0);
        let right = (x0 + i64::from(window_width)).min(i64::from(width));
        let bottom = (y0 + i64::from(window_height)).min(i64::from(height));
        if right <= left || bottom <= top {
            return Err(ReadError::InvalidRequest(
                "region lies entirely outside the slide".to_string(),
            ));
        }

        let crop_width = (right - left) as u32;
        let crop_height = (bottom - top) as u32;
        let cropped =
            imageops::crop_imm(&level.image, left as u32, top as u32, crop_width, crop_height)
                .to_image();

        let out_width = scaled_extent(crop_width, request.size.0, window_width);
        let out_height = scaled_extent(crop_height, request.size.1, window_height);
        return Ok(resample(
            cropped,
            out_width,
            out_height,
            request.interpolation,
            extra_scale,
        ));
    }

    let window = padded_window(
        &level.image,
        x0,
        y0,
        window_width,
        window_height,
        request.pad_mode,
    );
    Ok(resample(
        window,
        request.size.0,
        request.size.1,
        request.interpolation,
        extra_scale,
    ))
}

/// Output extent of a cropped window, proportional to the full window.
fn scaled_extent(cropped: u32, output: u32, window: u32) -> u32 {
    let scaled = (f64::from(cropped) * f64::from(output) / f64::from(window)).round();
    (scaled as u32).clamp(1, output)
}

/// Copy a window out of `image`, filling out-of-bounds pixels per `pad_mode`.
fn padded_window(
    image: &RgbImage,
    x0: i64,
    y0: i64,
    width: u32,
    height: u32,
    pad_mode: PadMode,
) -> RgbImage {
    let (image_width, image_height) = image.dimensions();

    let inside = x0 >= 0
        && y0 >= 0
        && x0 + i64::from(width) <= i64::from(image_width)
        && y0 + i64::from(height) <= i64::from(image_height);
    if inside {
        return imageops::crop_imm(image, x0 as u32, y0 as u32, width, height).to_image();
    }

    RgbImage::from_fn(width, height, |px, py| {
        let sx = source_index(x0 + i64::from(px), image_width, pad_mode);
        let sy = source_index(y0 + i64::from(py), image_height, pad_mode);
        match (sx, sy) {
            (Some(sx), Some(sy)) => *image.get_pixel(sx, sy),
            _ => Rgb([0, 0, 0]),
        }
    })
}

/// Map a possibly out-of-bounds coordinate to a source coordinate.
fn source_index(index: i64, extent: u32, pad_mode: PadMode) -> Option<u32> {
    if extent == 0 {
        return None;
    }
    let n = i64::from(extent);
    if (0..n).contains(&index) {
        return Some(index as u32);
    }

    match pad_mode {
        PadMode::Constant | PadMode::None => None,
        PadMode::Edge => Some(index.clamp(0, n - 1) as u32),
        PadMode::Reflect => Some(reflect_index(index, n) as u32),
    }
}

fn reflect_index(index: i64, n: i64) -> i64 {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let m = index.rem_euclid(period);
    if m >= n {
        period - m
    } else {
        m
    }
}

fn resample(
    image: RgbImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
    scale: f64,
) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image;
    }

    let filter = match interpolation {
        Interpolation::Nearest => FilterType::Nearest,
        Interpolation::Linear | Interpolation::Area => FilterType::Triangle,
        Interpolation::Cubic => FilterType::CatmullRom,
        Interpolation::Lanczos => FilterType::Lanczos3,
        Interpolation::Optimise if scale > 1.0 => FilterType::Triangle,
        Interpolation::Optimise => FilterType::CatmullRom,
    };
    imageops::resize(&image, width, height, filter)
}
