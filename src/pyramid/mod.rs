//! Pyramid geometry.
//!
//! Pure computations that turn a [`PyramidSpec`] into levels, tile grids and
//! source regions. Nothing in this module performs I/O.
//!
//! # Level Layout
//!
//! ```text
//!  level 0            level 1                level L-1 (full resolution)
//! ┌──────┐       ┌──────┬──────┐       ┌──────┬──────┬──────┬────┐
//! │ 0,0  │       │ 0,0  │ 1,0  │       │ 0,0  │ 1,0  │ 2,0  │3,0 │
//! └──────┘       ├──────┼──────┤  ...  ├──────┼──────┼──────┼────┤
//!                │ 0,1  │ 1,1  │       │ 0,1  │ 1,1  │ 2,1  │3,1 │
//!                └──────┴──────┘       └──────┴──────┴──────┴────┘
//! ```
//!
//! Each level is `downsample` times larger than the previous one. The last
//! row and column of a level may be partial; they are still part of the grid.

mod geometry;
mod region;
mod spec;

pub use geometry::{LevelGeometry, PyramidGeometry, TileAddress, TileAddresses};
pub use region::TileRegion;
pub use spec::{ceil_log2, PyramidSpec, TileParams, DEFAULT_DOWNSAMPLE, DEFAULT_TILE_SIZE};
