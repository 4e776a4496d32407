//! Tile pyramid generator.
//!
//! The generator combines a [`RegionReader`], a [`NamingStrategy`] and the
//! pyramid geometry. It renders single tiles on demand, streams the whole
//! pyramid lazily, and dumps it to a container.
//!
//! # Dump Pipeline
//!
//! ```text
//! addresses (canonical order)
//!     │
//!     ▼
//! render + encode      up to `concurrency` tiles in flight
//! (reader, encoder)    (futures::StreamExt::buffered keeps the order)
//!     │
//!     ▼
//! TileSink::write_tile one writer, canonical order
//! ```
//!
//! The (container, compression) pair and the naming strategy's path scheme
//! are checked before the container is created.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::container::ContainerSpec;
use crate::error::{PyramidError, ReadError};
use crate::layout::{
    DeepZoomLayout, DziDocument, DziFormat, GenericLayout, NamingStrategy, ZoomifyLayout,
};
use crate::pyramid::{PyramidGeometry, PyramidSpec, TileAddress, TileAddresses, TileParams};
use crate::slide::{Interpolation, PadMode, RegionReader, RegionRequest};

use super::cache::TilePathCache;
use super::encoder::{TileEncoder, DEFAULT_JPEG_QUALITY};

/// Generator without a path scheme; tiles can be rendered but not dumped.
pub type GenericGenerator<R> = TilePyramidGenerator<R, GenericLayout>;

/// Generator producing Deep Zoom pyramids.
pub type DeepZoomGenerator<R> = TilePyramidGenerator<R, DeepZoomLayout>;

/// Generator producing Zoomify pyramids.
pub type ZoomifyGenerator<R> = TilePyramidGenerator<R, ZoomifyLayout>;

// =============================================================================
// Rendered Tile
// =============================================================================

/// A rendered tile and its address.
#[derive(Debug, Clone)]
pub struct Tile {
    pub address: TileAddress,
    pub image: RgbImage,
}

// =============================================================================
// Dump Options
// =============================================================================

/// Options for [`TilePyramidGenerator::dump`].
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Output container and its compression
    pub container: ContainerSpec,

    /// JPEG quality for encoded tiles (1-100)
    pub jpeg_quality: u8,

    /// Maximum number of tiles rendered at once
    pub concurrency: usize,

    /// Padding mode; `None` uses the naming strategy's default
    pub pad_mode: Option<PadMode>,

    pub interpolation: Interpolation,

    /// Cooperative cancellation flag, checked between tiles
    pub cancel: Option<Arc<AtomicBool>>,
}

impl DumpOptions {
    pub fn new(container: ContainerSpec) -> Self {
        Self {
            container,
            ..Self::default()
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_pad_mode(mut self, pad_mode: PadMode) -> Self {
        self.pad_mode = Some(pad_mode);
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            container: ContainerSpec::directory(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            concurrency: 1,
            pad_mode: None,
            interpolation: Interpolation::default(),
            cancel: None,
        }
    }
}

/// Outcome of a completed dump.
#[derive(Debug, Clone, PartialEq)]
pub struct DumpSummary {
    pub tiles_written: u64,
    pub level_count: u32,
    pub elapsed: Duration,
}

// =============================================================================
// Tile Pyramid Generator
// =============================================================================

/// Renders the tiles of a pyramid over a region reader.
///
/// # Type Parameters
///
/// * `R` - The slide behind the pyramid
/// * `L` - The naming strategy (generic, Deep Zoom or Zoomify)
///
/// # Example
///
/// ```no_run
/// use wsi_pyramid::layout::DeepZoomLayout;
/// use wsi_pyramid::slide::ImageRegionReader;
/// use wsi_pyramid::tile::{DumpOptions, TilePyramidGenerator};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let reader = ImageRegionReader::open("slide.png")?;
/// let generator = TilePyramidGenerator::with_defaults(reader, DeepZoomLayout)?;
///
/// let tile = generator.get_tile_default(generator.level_count() - 1, 0, 0).await?;
/// println!("{}x{}", tile.width(), tile.height());
///
/// generator.dump("slide_files", &DumpOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub struct TilePyramidGenerator<R, L> {
    reader: R,
    layout: L,
    geometry: PyramidGeometry,
    paths: TilePathCache,
    thumbnail: OnceCell<RgbImage>,
}

impl<R: RegionReader, L: NamingStrategy> TilePyramidGenerator<R, L> {
    /// Create a generator with explicit tile parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::InvalidSpec`] for a zero-sized slide, a zero
    /// tile size or a downsample below 1.
    pub fn new(reader: R, layout: L, params: TileParams) -> Result<Self, PyramidError> {
        let (width, height) = reader.dimensions();
        let spec = PyramidSpec::new(width, height, params)?;
        let geometry = layout.geometry(spec);

        debug!(
            layout = layout.name(),
            width,
            height,
            tile_size = params.tile_size,
            overlap = params.overlap,
            downsample = params.downsample,
            levels = geometry.level_count(),
            tiles = geometry.tile_count(),
            "Created pyramid generator"
        );

        Ok(Self {
            reader,
            layout,
            geometry,
            paths: TilePathCache::new(),
            thumbnail: OnceCell::new(),
        })
    }

    /// Create a generator with the naming strategy's default parameters.
    pub fn with_defaults(reader: R, layout: L) -> Result<Self, PyramidError> {
        let params = layout.default_params();
        Self::new(reader, layout, params)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn geometry(&self) -> &PyramidGeometry {
        &self.geometry
    }

    pub fn spec(&self) -> &PyramidSpec {
        self.geometry.spec()
    }

    pub fn level_count(&self) -> u32 {
        self.geometry.level_count()
    }

    /// Total number of tiles over all levels.
    pub fn tile_count(&self) -> u64 {
        self.geometry.tile_count()
    }

    /// Every tile address in canonical order.
    pub fn addresses(&self) -> TileAddresses<'_> {
        self.geometry.addresses()
    }

    // -------------------------------------------------------------------------
    // Tile Access
    // -------------------------------------------------------------------------

    /// Render the tile at (`level`, `x`, `y`).
    ///
    /// The address is checked against the level's grid before the reader is
    /// touched. Sub-tile levels are cut from the overview thumbnail; other
    /// levels read `output_tile_size` pixels around the tile, with `pad_mode`
    /// and `interpolation` passed to the reader unchanged.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::LevelOutOfRange`] / [`PyramidError::TileOutOfRange`]
    /// - [`PyramidError::Read`] for any reader failure
    pub async fn get_tile(
        &self,
        level: u32,
        x: u32,
        y: u32,
        pad_mode: PadMode,
        interpolation: Interpolation,
    ) -> Result<RgbImage, PyramidError> {
        self.render(TileAddress::new(level, x, y), pad_mode, interpolation)
            .await
    }

    /// Render a tile with the naming strategy's default padding and
    /// [`Interpolation::Optimise`].
    pub async fn get_tile_default(
        &self,
        level: u32,
        x: u32,
        y: u32,
    ) -> Result<RgbImage, PyramidError> {
        self.get_tile(
            level,
            x,
            y,
            self.layout.default_pad_mode(),
            Interpolation::default(),
        )
        .await
    }

    async fn render(
        &self,
        address: TileAddress,
        pad_mode: PadMode,
        interpolation: Interpolation,
    ) -> Result<RgbImage, PyramidError> {
        self.geometry.validate(address)?;

        if self.geometry.is_sub_tile_level(address.level) {
            let thumbnail = self.overview_thumbnail().await?;
            return Ok(fit_within(&thumbnail, 1u32 << address.level.min(31)));
        }

        let region = self.geometry.tile_region(address)?;
        let request = RegionRequest::from_region(&region, pad_mode, interpolation);

        debug!(
            level = address.level,
            x = address.x,
            y = address.y,
            origin_x = request.origin.0,
            origin_y = request.origin.1,
            resolution = request.resolution,
            pad_mode = %pad_mode,
            "Reading tile region"
        );

        Ok(self.reader.read_region(&request).await?)
    }

    /// Whole-slide thumbnail whose longest edge equals the tile size.
    ///
    /// Built from the reader's lowest-detail level and computed once.
    pub async fn overview_thumbnail(&self) -> Result<RgbImage, PyramidError> {
        let thumbnail = self
            .thumbnail
            .get_or_try_init(|| async {
                let reader_levels = self.reader.level_count();
                if reader_levels == 0 {
                    return Err(PyramidError::Read(ReadError::InvalidLevel {
                        level: 0,
                        level_count: 0,
                    }));
                }
                let overview = self.reader.read_level(reader_levels - 1).await?;
                Ok::<_, PyramidError>(resize_to_edge(&overview, self.spec().tile_size()))
            })
            .await?;
        Ok(thumbnail.clone())
    }

    /// Lazy stream of every tile in canonical order.
    ///
    /// Tiles are rendered one at a time as the stream is polled, with the
    /// strategy's default padding. The first error is yielded and ends the
    /// stream. Calling `tiles()` again starts over.
    pub fn tiles(&self) -> impl Stream<Item = Result<Tile, PyramidError>> + '_ {
        let pad_mode = self.layout.default_pad_mode();
        stream::unfold(Some(self.addresses()), move |addresses| async move {
            let mut addresses = addresses?;
            let address = addresses.next()?;
            match self.render(address, pad_mode, Interpolation::default()).await {
                Ok(image) => Some((Ok(Tile { address, image }), Some(addresses))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    // -------------------------------------------------------------------------
    // Paths
    // -------------------------------------------------------------------------

    /// Relative path of the tile at (`level`, `x`, `y`), memoized.
    pub fn tile_path(&self, level: u32, x: u32, y: u32) -> Result<Arc<str>, PyramidError> {
        self.tile_path_at(TileAddress::new(level, x, y))
    }

    fn tile_path_at(&self, address: TileAddress) -> Result<Arc<str>, PyramidError> {
        self.paths
            .get_or_try_insert(address, || self.layout.tile_path(&self.geometry, address))
    }

    // -------------------------------------------------------------------------
    // Dump
    // -------------------------------------------------------------------------

    /// Parse the container and compression names, then dump with default
    /// options.
    ///
    /// Invalid names or combinations fail before anything is rendered or
    /// created.
    pub async fn dump_with(
        &self,
        destination: impl AsRef<Path>,
        container: Option<&str>,
        compression: Option<&str>,
    ) -> Result<DumpSummary, PyramidError> {
        let container = ContainerSpec::from_names(container, compression)?;
        self.dump(destination, &DumpOptions::new(container)).await
    }

    /// Render every tile and write it to `destination`.
    ///
    /// Tiles are rendered up to `options.concurrency` at a time and written
    /// in canonical order by this task. A reader, encoder or container error
    /// aborts the dump; the container is dropped without being finalized.
    ///
    /// # Errors
    ///
    /// - [`PyramidError::PathsUnavailable`] for the generic layout, before
    ///   any I/O
    /// - [`PyramidError::Cancelled`] when the cancel flag is raised
    /// - reader, encoder, I/O and archive errors
    pub async fn dump(
        &self,
        destination: impl AsRef<Path>,
        options: &DumpOptions,
    ) -> Result<DumpSummary, PyramidError> {
        let destination = destination.as_ref();
        let container = options.container;

        // Fail on a missing path scheme before creating anything
        self.tile_path_at(TileAddress::new(0, 0, 0))?;

        let started = Instant::now();
        info!(
            destination = %destination.display(),
            layout = self.layout.name(),
            container = %container,
            levels = self.level_count(),
            tiles = self.tile_count(),
            concurrency = options.concurrency,
            "Dumping tile pyramid"
        );

        let mut sink = container.open(destination)?;

        let encoder = TileEncoder::new(options.jpeg_quality);
        let pad_mode = options
            .pad_mode
            .unwrap_or_else(|| self.layout.default_pad_mode());
        let interpolation = options.interpolation;

        let rendered = stream::iter(self.addresses())
            .map(|address| {
                self.render_encoded(address, container, encoder, pad_mode, interpolation)
            })
            .buffered(options.concurrency.max(1));
        let mut rendered = std::pin::pin!(rendered);

        let mut written = 0u64;
        while let Some(result) = rendered.next().await {
            if options.is_cancelled() {
                warn!(written, total = self.tile_count(), "Dump cancelled");
                return Err(PyramidError::Cancelled { written });
            }

            let (path, data) = result?;
            sink.write_tile(&path, &data)?;
            written += 1;
        }

        sink.finish()?;

        let summary = DumpSummary {
            tiles_written: written,
            level_count: self.level_count(),
            elapsed: started.elapsed(),
        };
        info!(
            tiles = summary.tiles_written,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Tile pyramid written"
        );
        Ok(summary)
    }

    async fn render_encoded(
        &self,
        address: TileAddress,
        container: ContainerSpec,
        encoder: TileEncoder,
        pad_mode: PadMode,
        interpolation: Interpolation,
    ) -> Result<(Arc<str>, Bytes), PyramidError> {
        let path = self.tile_path_at(address)?;
        let format = container.tile_format(&path)?;
        let image = self.render(address, pad_mode, interpolation).await?;

        let data = tokio::task::spawn_blocking(move || encoder.encode(&image, format)).await??;

        debug!(
            level = address.level,
            x = address.x,
            y = address.y,
            path = %path,
            bytes = data.len(),
            "Rendered tile"
        );
        Ok((path, data))
    }
}

// =============================================================================
// Strategy-specific Operations
// =============================================================================

impl<R: RegionReader> TilePyramidGenerator<R, DeepZoomLayout> {
    /// The `.dzi` descriptor of this pyramid.
    pub fn dzi_document(&self, tile_format: &str) -> DziDocument {
        self.layout.descriptor(self.spec(), tile_format)
    }

    /// Render the `.dzi` descriptor in the named format (`xml` or `json`).
    ///
    /// # Errors
    ///
    /// Returns [`PyramidError::Config`] for an unknown format name.
    pub fn dzi(&self, format: &str, tile_format: &str) -> Result<String, PyramidError> {
        let format: DziFormat = format.parse()?;
        self.dzi_document(tile_format).render(format)
    }
}

impl<R: RegionReader> TilePyramidGenerator<R, ZoomifyLayout> {
    /// Zoomify tile group of the tile at (`level`, `x`, `y`).
    pub fn tile_group(&self, level: u32, x: u32, y: u32) -> Result<u64, PyramidError> {
        self.layout
            .tile_group(&self.geometry, TileAddress::new(level, x, y))
    }
}

// =============================================================================
// Thumbnail Helpers
// =============================================================================

/// Resize so the longest edge equals `edge`, preserving the aspect ratio.
fn resize_to_edge(image: &RgbImage, edge: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest == edge || longest == 0 {
        return image.clone();
    }

    let scale = f64::from(edge) / f64::from(longest);
    let new_width = ((f64::from(width) * scale).round() as u32).clamp(1, edge);
    let new_height = ((f64::from(height) * scale).round() as u32).clamp(1, edge);
    let filter = if scale < 1.0 {
        FilterType::Triangle
    } else {
        FilterType::CatmullRom
    };
    imageops::resize(image, new_width, new_height, filter)
}

/// Shrink to fit inside `max_edge x max_edge`; never enlarges.
fn fit_within(image: &RgbImage, max_edge: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width <= max_edge && height <= max_edge {
        return image.clone();
    }
    resize_to_edge(image, max_edge)
}
