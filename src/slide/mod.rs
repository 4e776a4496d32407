//! Slide abstraction layer.
//!
//! This module defines how the pyramid generator talks to a slide: the
//! [`RegionReader`] trait plus the padding and interpolation policies passed
//! through to it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          TilePyramidGenerator           │
//! └────────────────────┬────────────────────┘
//!                      │  RegionRequest
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          RegionReader Trait             │
//! │  (format-agnostic region interface)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │ImageRegionReader│    │  your slide reader  │
//! │ (decoded raster)│    │ (OpenSlide, TIFF..) │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod image_reader;
mod reader;

pub use image_reader::{ImageRegionReader, DEFAULT_MAX_OVERVIEW_DIMENSION};
pub use reader::{
    best_level_for_downsample, Interpolation, PadMode, RegionReader, RegionRequest,
};
