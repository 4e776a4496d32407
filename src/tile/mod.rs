//! Tile generation layer.
//!
//! This module renders pyramid tiles from a slide and writes them out.
//!
//! # Architecture
//!
//! The generator sits between the caller and the slide abstraction:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        CLI / library caller             │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          TilePyramidGenerator           │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │TilePathCache │  │  TileEncoder    │  │
//! │  │  (memoized   │  │  (RGB → JPEG /  │  │
//! │  │   paths)     │  │   PNG)          │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └──────────┬─────────────────┬────────────┘
//!            │                 │
//!            ▼                 ▼
//! ┌──────────────────┐ ┌──────────────────┐
//! │   RegionReader   │ │    TileSink      │
//! └──────────────────┘ └──────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TilePyramidGenerator`]: Tile access, lazy enumeration and dumps
//! - [`TilePathCache`]: LRU memo of tile paths
//! - [`TileEncoder`]: Encodes rendered tiles as JPEG or PNG
//! - [`DumpOptions`]: Container, quality, concurrency and cancellation
//!
//! # Example
//!
//! ```no_run
//! use wsi_pyramid::layout::ZoomifyLayout;
//! use wsi_pyramid::slide::ImageRegionReader;
//! use wsi_pyramid::tile::TilePyramidGenerator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = ImageRegionReader::open("slide.png")?;
//!     let generator = TilePyramidGenerator::with_defaults(reader, ZoomifyLayout)?;
//!
//!     println!("{} tiles over {} levels", generator.tile_count(), generator.level_count());
//!     println!("{}", generator.tile_path(0, 0, 0)?);
//!
//!     generator.dump_with("slide.tar", Some("tar"), Some("gzip")).await?;
//!     Ok(())
//! }
//! ```

mod cache;
mod encoder;
mod generator;

pub use cache::{TilePathCache, DEFAULT_PATH_CACHE_CAPACITY};
pub use encoder::{
    clamp_quality, is_valid_quality, TileEncoder, TileFormat, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use generator::{
    DeepZoomGenerator, DumpOptions, DumpSummary, GenericGenerator, Tile, TilePyramidGenerator,
    ZoomifyGenerator,
};
