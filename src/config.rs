//! Configuration for the `wsi-pyramid` command.
//!
//! Options come from command-line arguments via clap, with environment
//! variable fallbacks using the `WSI_PYRAMID_` prefix.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use wsi_pyramid::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Writing {} to {}", config.input.display(), config.output.display());
//! ```
//!
//! # Environment Variables
//!
//! - `WSI_PYRAMID_INPUT` - Source image
//! - `WSI_PYRAMID_OUTPUT` - Output directory or archive path
//! - `WSI_PYRAMID_LAYOUT` - deepzoom, zoomify or generic (default: deepzoom)
//! - `WSI_PYRAMID_CONTAINER` - dir, zip or tar (default: dir)
//! - `WSI_PYRAMID_COMPRESSION` - none, deflate, gzip, bz2 or lzma (default: none)
//! - `WSI_PYRAMID_TILE_SIZE`, `WSI_PYRAMID_OVERLAP`, `WSI_PYRAMID_DOWNSAMPLE`
//! - `WSI_PYRAMID_JPEG_QUALITY` - JPEG quality (default: 80)
//! - `WSI_PYRAMID_CONCURRENCY` - Tiles rendered in parallel (default: CPU count)

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::container::{Compression, ContainerKind, ContainerSpec};
use crate::error::PyramidError;
use crate::layout::DziFormat;
use crate::pyramid::TileParams;
use crate::slide::{Interpolation, PadMode};
use crate::tile::{is_valid_quality, DumpOptions, DEFAULT_JPEG_QUALITY};

// =============================================================================
// Layout Selection
// =============================================================================

/// Naming convention of the generated pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LayoutKind {
    /// `{level}/{x}_{y}.jpg` plus a `.dzi` descriptor
    #[default]
    Deepzoom,

    /// `TileGroup{g}/{level}-{x}-{y}.jpg`
    Zoomify,

    /// Plain geometry without a path scheme (cannot be written)
    Generic,
}

/// Default number of tiles rendered in parallel.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// WSI Pyramid - Generate web tile pyramids from large images.
///
/// Cuts an image into a Deep Zoom or Zoomify tile pyramid and writes it to a
/// directory, a ZIP archive or a TAR archive.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-pyramid")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Input / Output
    // =========================================================================
    /// Source image (any format the `image` crate decodes: PNG, JPEG, ...).
    #[arg(env = "WSI_PYRAMID_INPUT")]
    pub input: PathBuf,

    /// Output directory, or archive file for zip/tar containers.
    #[arg(env = "WSI_PYRAMID_OUTPUT")]
    pub output: PathBuf,

    /// Pyramid naming convention.
    #[arg(long, value_enum, default_value_t = LayoutKind::Deepzoom, env = "WSI_PYRAMID_LAYOUT")]
    pub layout: LayoutKind,

    /// Output container: dir, zip or tar.
    #[arg(long, default_value = "dir", env = "WSI_PYRAMID_CONTAINER")]
    pub container: ContainerKind,

    /// Container compression: none, deflate (zip), gzip (tar), bz2 or lzma.
    #[arg(long, default_value = "none", env = "WSI_PYRAMID_COMPRESSION")]
    pub compression: Compression,

    // =========================================================================
    // Pyramid Geometry
    // =========================================================================
    /// Tile size in pixels, overlap excluded (layout default when omitted).
    #[arg(long, env = "WSI_PYRAMID_TILE_SIZE")]
    pub tile_size: Option<u32>,

    /// Pixels of overlap added on each tile edge (layout default when omitted).
    #[arg(long, env = "WSI_PYRAMID_OVERLAP")]
    pub overlap: Option<u32>,

    /// Downsample factor between levels (layout default when omitted).
    #[arg(long, env = "WSI_PYRAMID_DOWNSAMPLE")]
    pub downsample: Option<u32>,

    // =========================================================================
    // Rendering
    // =========================================================================
    /// JPEG quality for tile encoding (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "WSI_PYRAMID_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Maximum number of tiles rendered in parallel.
    #[arg(long, default_value_t = default_concurrency(), env = "WSI_PYRAMID_CONCURRENCY")]
    pub concurrency: usize,

    /// Padding for tiles extending past the image: constant, edge, reflect
    /// or none (layout default when omitted).
    #[arg(long, env = "WSI_PYRAMID_PAD_MODE")]
    pub pad_mode: Option<PadMode>,

    /// Resampling filter: optimise, nearest, linear, cubic, lanczos or area.
    #[arg(long, default_value = "optimise", env = "WSI_PYRAMID_INTERPOLATION")]
    pub interpolation: Interpolation,

    // =========================================================================
    // Deep Zoom Descriptor
    // =========================================================================
    /// Write the `.dzi` descriptor to this path (deepzoom layout only).
    #[arg(long, env = "WSI_PYRAMID_DESCRIPTOR")]
    pub descriptor: Option<PathBuf>,

    /// Descriptor serialization: xml or json.
    #[arg(long, default_value = "xml", env = "WSI_PYRAMID_DESCRIPTOR_FORMAT")]
    pub descriptor_format: DziFormat,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration.
    ///
    /// Returns an error message if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.layout == LayoutKind::Generic {
            return Err(
                "The generic layout has no tile path scheme; use --layout deepzoom or zoomify"
                    .to_string(),
            );
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }

        if self.tile_size == Some(0) {
            return Err("tile_size must be greater than 0".to_string());
        }
        if self.downsample == Some(0) {
            return Err("downsample must be at least 1".to_string());
        }

        if self.descriptor.is_some() && self.layout != LayoutKind::Deepzoom {
            return Err("--descriptor is only available with the deepzoom layout".to_string());
        }

        self.container_spec().map_err(|e| e.to_string())?;

        Ok(())
    }

    /// The validated (container, compression) pair.
    pub fn container_spec(&self) -> Result<ContainerSpec, PyramidError> {
        ContainerSpec::new(self.container, self.compression)
    }

    /// Tile parameters, falling back to `defaults` for omitted options.
    pub fn tile_params(&self, defaults: TileParams) -> TileParams {
        TileParams::new(
            self.tile_size.unwrap_or(defaults.tile_size),
            self.overlap.unwrap_or(defaults.overlap),
            self.downsample.unwrap_or(defaults.downsample),
        )
    }

    /// Dump options for this configuration.
    pub fn dump_options(&self) -> Result<DumpOptions, PyramidError> {
        let mut options = DumpOptions::new(self.container_spec()?)
            .with_jpeg_quality(self.jpeg_quality)
            .with_concurrency(self.concurrency)
            .with_interpolation(self.interpolation);
        options.pad_mode = self.pad_mode;
        Ok(options)
    }
}

// =============================================================================
// Tests
// =============================================================================
