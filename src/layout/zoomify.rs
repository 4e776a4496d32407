//! Zoomify layout.
//!
//! Zoomify viewers expect tiles bucketed into `TileGroup` directories of at
//! most 256 files each. Tiles are numbered across the whole pyramid in
//! canonical order (level ascending, then rows, then columns) and the group
//! is that running number divided by 256:
//!
//! ```text
//! TileGroup0/0-0-0.jpg
//! TileGroup0/1-0-0.jpg  TileGroup0/1-1-0.jpg ...
//! ...
//! TileGroup1/4-11-10.jpg      <- the 257th tile of the pyramid
//! ```

use crate::error::PyramidError;
use crate::pyramid::{PyramidGeometry, TileAddress};

use super::NamingStrategy;

/// Maximum number of tiles per `TileGroup` directory.
pub const ZOOMIFY_TILE_GROUP_SIZE: u64 = 256;

/// Zoomify naming strategy.
///
/// Uses the geometric level list unchanged; level 0 is the coarsest level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoomifyLayout;

impl ZoomifyLayout {
    /// Tile group holding the tile at `address`.
    pub fn tile_group(
        &self,
        geometry: &PyramidGeometry,
        address: TileAddress,
    ) -> Result<u64, PyramidError> {
        Ok(geometry.global_index(address)? / ZOOMIFY_TILE_GROUP_SIZE)
    }
}

impl NamingStrategy for ZoomifyLayout {
    fn name(&self) -> &'static str {
        "zoomify"
    }

    fn tile_path(
        &self,
        geometry: &PyramidGeometry,
        address: TileAddress,
    ) -> Result<String, PyramidError> {
        let group = self.tile_group(geometry, address)?;
        Ok(format!(
            "TileGroup{}/{}-{}-{}.jpg",
            group, address.level, address.x, address.y
        ))
    }
}
