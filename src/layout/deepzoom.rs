//! Deep Zoom Image (DZI) layout.
//!
//! Tiles are written as `{level}/{x}_{y}.jpg` next to a `.dzi` descriptor
//! that OpenSeadragon and other Deep Zoom viewers read.
//!
//! # Level Layout
//!
//! Deep Zoom level 0 is a 1x1 pixel image and every level doubles in size.
//! Levels smaller than one tile ("sub-tile" levels) are not cut from the
//! slide: they are thumbnails of the whole image fitted inside
//! `2^level x 2^level` pixels.
//!
//! ```text
//! level:   0    1    2   ...   7       8 ...            L-1
//!          ·    ▪    ■        [128px]  [tiles]  ...     [full resolution]
//!          └─── sub-tile levels ───┘   └──── tile-bearing levels ────┘
//! ```

use std::fmt;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use crate::error::PyramidError;
use crate::pyramid::{ceil_log2, PyramidGeometry, PyramidSpec, TileAddress, TileParams};
use crate::slide::PadMode;

use super::NamingStrategy;

/// XML namespace of Deep Zoom descriptors.
pub const DEEPZOOM_XMLNS: &str = "http://schemas.microsoft.com/deepzoom/2008";

/// Deep Zoom default: 254 + 2 * 1 = 256 pixel tiles.
const DEEPZOOM_TILE_SIZE: u32 = 254;
const DEEPZOOM_OVERLAP: u32 = 1;

// =============================================================================
// DeepZoom Layout
// =============================================================================

/// Deep Zoom naming strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepZoomLayout;

impl NamingStrategy for DeepZoomLayout {
    fn name(&self) -> &'static str {
        "deepzoom"
    }

    fn default_params(&self) -> TileParams {
        TileParams::new(DEEPZOOM_TILE_SIZE, DEEPZOOM_OVERLAP, 2)
    }

    /// `ceil(log2(output_tile_size))`: 8 for 256 pixel tiles.
    fn sub_tile_level_count(&self, params: &TileParams) -> u32 {
        ceil_log2(params.output_tile_size())
    }

    fn level_count_adjustment(&self) -> i32 {
        -1
    }

    fn default_pad_mode(&self) -> PadMode {
        PadMode::None
    }

    fn tile_path(
        &self,
        geometry: &PyramidGeometry,
        address: TileAddress,
    ) -> Result<String, PyramidError> {
        geometry.validate(address)?;
        Ok(format!("{}/{}_{}.jpg", address.level, address.x, address.y))
    }
}

impl DeepZoomLayout {
    /// Build the `.dzi` descriptor for `spec`.
    ///
    /// `tile_format` is the tile file extension (usually `jpg`).
    pub fn descriptor(&self, spec: &PyramidSpec, tile_format: &str) -> DziDocument {
        DziDocument::new(spec, tile_format)
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Serialization of a `.dzi` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DziFormat {
    /// `<Image>` element tree
    #[default]
    Xml,

    /// Nested JSON object with string values
    Json,
}

impl FromStr for DziFormat {
    type Err = PyramidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(DziFormat::Xml),
            "json" => Ok(DziFormat::Json),
            other => Err(PyramidError::Config(format!(
                "unsupported DZI format '{}' (expected xml or json)",
                other
            ))),
        }
    }
}

impl fmt::Display for DziFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DziFormat::Xml => f.write_str("xml"),
            DziFormat::Json => f.write_str("json"),
        }
    }
}

/// Deep Zoom descriptor; serializes to the JSON form directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DziDocument {
    #[serde(rename = "Image")]
    pub image: DziImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DziImage {
    pub xmlns: String,

    #[serde(rename = "Format")]
    pub format: String,

    #[serde(rename = "Overlap")]
    pub overlap: String,

    /// Output tile size, overlap included
    #[serde(rename = "TileSize")]
    pub tile_size: String,

    #[serde(rename = "Size")]
    pub size: DziSize,
}

/// `Size` element.
///
/// `Height` carries the slide width and `Width` the slide height. Existing
/// consumers of these pyramids read the attributes this way, so the mapping
/// is kept as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DziSize {
    #[serde(rename = "Height")]
    pub height: String,

    #[serde(rename = "Width")]
    pub width: String,
}

impl DziDocument {
    pub fn new(spec: &PyramidSpec, tile_format: &str) -> Self {
        let (width, height) = spec.base_dimensions();
        Self {
            image: DziImage {
                xmlns: DEEPZOOM_XMLNS.to_string(),
                format: tile_format.to_string(),
                overlap: spec.overlap().to_string(),
                tile_size: spec.output_tile_size().to_string(),
                size: DziSize {
                    height: width.to_string(),
                    width: height.to_string(),
                },
            },
        }
    }

    /// Render the XML form.
    ///
    /// # Example Output
    ///
    /// ```xml
    /// <?xml version="1.0" encoding="UTF-8"?>
    /// <Image xmlns="http://schemas.microsoft.com/deepzoom/2008" Format="jpg" Overlap="1"
    ///        TileSize="256">
    ///   <Size Height="46920" Width="33600"/>
    /// </Image>
    /// ```
    pub fn to_xml(&self) -> Result<String, PyramidError> {
        let image = &self.image;
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        writer
            .create_element("Image")
            .with_attributes([
                ("xmlns", image.xmlns.as_str()),
                ("Format", image.format.as_str()),
                ("Overlap", image.overlap.as_str()),
                ("TileSize", image.tile_size.as_str()),
            ])
            .write_inner_content(|w| {
                w.create_element("Size")
                    .with_attributes([
                        ("Height", image.size.height.as_str()),
                        ("Width", image.size.width.as_str()),
                    ])
                    .write_empty()?;
                Ok::<_, quick_xml::Error>(())
            })
            .map_err(xml_error)?;

        let mut xml = String::from_utf8(writer.into_inner()).map_err(|e| PyramidError::Encode {
            message: format!("DZI XML: {}", e),
        })?;
        xml.push('\n');
        Ok(xml)
    }

    /// Render the JSON form.
    pub fn to_json(&self) -> Result<String, PyramidError> {
        serde_json::to_string_pretty(self).map_err(|e| PyramidError::Encode {
            message: format!("DZI JSON: {}", e),
        })
    }

    /// Render in `format`.
    pub fn render(&self, format: DziFormat) -> Result<String, PyramidError> {
        match format {
            DziFormat::Xml => self.to_xml(),
            DziFormat::Json => self.to_json(),
        }
    }
}

fn xml_error(err: quick_xml::Error) -> PyramidError {
    PyramidError::Encode {
        message: format!("DZI XML: {}", err),
    }
}
