//! # WSI Pyramid
//!
//! Generates web-servable tile pyramids from Whole Slide Images.
//!
//! A large image is cut into a pyramid of fixed-size tiles, one grid per
//! resolution level, and written in the Deep Zoom or Zoomify conventions to a
//! directory, a ZIP archive or a TAR archive.
//!
//! ## Features
//!
//! - **Exact pyramid geometry**: level counts, level sizes, tile grids and
//!   source regions, including partial edge tiles and tile overlap
//! - **Deep Zoom**: sub-tile levels, `{level}/{x}_{y}.jpg` paths, `.dzi`
//!   descriptors in XML or JSON
//! - **Zoomify**: `TileGroup` bucketing over the whole pyramid
//! - **Parallel dumps**: tiles are rendered concurrently and written in order
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`pyramid`] - Pure level and tile geometry
//! - [`layout`] - Naming strategies (generic, Deep Zoom, Zoomify)
//! - [`slide`] - Region reader abstraction and an image-backed reader
//! - [`tile`] - Tile generator, path cache and encoder
//! - [`container`] - Directory, ZIP and TAR output
//! - [`config`] - CLI configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_pyramid::{DeepZoomLayout, DumpOptions, ImageRegionReader, TilePyramidGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = ImageRegionReader::open("slide.png")?;
//!     let generator = TilePyramidGenerator::with_defaults(reader, DeepZoomLayout)?;
//!
//!     std::fs::write("slide.dzi", generator.dzi("xml", "jpg")?)?;
//!     generator.dump("slide_files", &DumpOptions::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod container;
pub mod error;
pub mod layout;
pub mod pyramid;
pub mod slide;
pub mod tile;

// Re-export commonly used types
pub use config::{Config, LayoutKind};
pub use container::{Compression, ContainerKind, ContainerSpec, TileSink};
pub use error::{PyramidError, ReadError};
pub use layout::{DeepZoomLayout, DziFormat, GenericLayout, NamingStrategy, ZoomifyLayout};
pub use pyramid::{
    LevelGeometry, PyramidGeometry, PyramidSpec, TileAddress, TileParams, TileRegion,
};
pub use slide::{ImageRegionReader, Interpolation, PadMode, RegionReader, RegionRequest};
pub use tile::{
    DeepZoomGenerator, DumpOptions, DumpSummary, TileEncoder, TilePyramidGenerator,
    ZoomifyGenerator,
};
