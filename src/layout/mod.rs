//! Tile naming strategies.
//!
//! A [`NamingStrategy`] decides how tiles are named on disk and how the
//! pyramid's level list differs from the plain geometric one:
//!
//! | Strategy   | Tile path                          | Levels                         |
//! |------------|------------------------------------|--------------------------------|
//! | Generic    | none (must be overridden)          | geometric                      |
//! | DeepZoom   | `{level}/{x}_{y}.jpg`              | sub-tile levels, one fewer     |
//! | Zoomify    | `TileGroup{g}/{level}-{x}-{y}.jpg` | geometric                      |

mod deepzoom;
mod zoomify;

pub use deepzoom::{
    DeepZoomLayout, DziDocument, DziFormat, DziImage, DziSize, DEEPZOOM_XMLNS,
};
pub use zoomify::{ZoomifyLayout, ZOOMIFY_TILE_GROUP_SIZE};

use crate::error::PyramidError;
use crate::pyramid::{PyramidGeometry, PyramidSpec, TileAddress, TileParams};
use crate::slide::PadMode;

// =============================================================================
// NamingStrategy Trait
// =============================================================================

/// Capabilities that distinguish one pyramid convention from another.
pub trait NamingStrategy: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Tile parameters used when the caller does not choose any.
    fn default_params(&self) -> TileParams {
        TileParams::default()
    }

    /// Number of leading levels rendered from the overview thumbnail.
    fn sub_tile_level_count(&self, _params: &TileParams) -> u32 {
        0
    }

    /// Added to the geometric level count (after sub-tile levels).
    fn level_count_adjustment(&self) -> i32 {
        0
    }

    /// Padding mode used by `get_tile_default`.
    fn default_pad_mode(&self) -> PadMode {
        PadMode::Constant
    }

    /// Relative path of the tile at `address`.
    fn tile_path(
        &self,
        geometry: &PyramidGeometry,
        address: TileAddress,
    ) -> Result<String, PyramidError>;

    /// Build the level geometry this strategy implies for `spec`.
    fn geometry(&self, spec: PyramidSpec) -> PyramidGeometry {
        PyramidGeometry::new(
            spec,
            self.sub_tile_level_count(&spec.params()),
            self.level_count_adjustment(),
        )
    }
}

// =============================================================================
// Generic Layout
// =============================================================================

/// Plain geometric pyramid without a path scheme.
///
/// Tiles can be rendered and enumerated, but [`NamingStrategy::tile_path`]
/// fails: writing a pyramid needs a concrete convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericLayout;

impl NamingStrategy for GenericLayout {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn tile_path(
        &self,
        _geometry: &PyramidGeometry,
        _address: TileAddress,
    ) -> Result<String, PyramidError> {
        Err(PyramidError::PathsUnavailable {
            layout: self.name(),
        })
    }
}
