//! Generic tile generator integration tests.
//!
//! Tests verify:
//! - Level geometry exposed by the generator
//! - Region requests sent to the reader (origin, resolution, pass-through
//!   padding and interpolation)
//! - Out-of-range addresses never reach the reader
//! - Lazy tile streams enumerate every tile once, in canonical order

use std::collections::HashSet;

use futures::StreamExt;

use wsi_pyramid::error::{PyramidError, ReadError};
use wsi_pyramid::layout::GenericLayout;
use wsi_pyramid::pyramid::{TileAddress, TileParams};
use wsi_pyramid::slide::{Interpolation, PadMode};
use wsi_pyramid::tile::TilePyramidGenerator;

use super::test_utils::TrackingRegionReader;

fn generic(
    reader: TrackingRegionReader,
    params: TileParams,
) -> TilePyramidGenerator<TrackingRegionReader, GenericLayout> {
    TilePyramidGenerator::new(reader, GenericLayout, params).unwrap()
}

// =============================================================================
// Geometry
// =============================================================================

#[test]
fn test_square_slide_geometry() {
    let generator = generic(TrackingRegionReader::new(1000, 1000), TileParams::new(256, 0, 2));
    let geometry = generator.geometry();

    assert_eq!(generator.level_count(), 3);
    assert_eq!(geometry.level_dimensions(2).unwrap(), (1000, 1000));
    assert_eq!(geometry.tile_grid(2).unwrap(), (4, 4));
    assert_eq!(geometry.level_dimensions(1).unwrap(), (500, 500));
    assert_eq!(geometry.tile_grid(1).unwrap(), (2, 2));
    assert_eq!(geometry.level_dimensions(0).unwrap(), (250, 250));
    assert_eq!(geometry.tile_grid(0).unwrap(), (1, 1));
    assert_eq!(generator.tile_count(), 1 + 4 + 16);
}

#[test]
fn test_finest_level_matches_slide() {
    for (width, height) in [(1, 1), (255, 3000), (4097, 4095), (46920, 33600)] {
        for params in [
            TileParams::new(256, 0, 2),
            TileParams::new(254, 1, 2),
            TileParams::new(512, 0, 4),
        ] {
            let generator = generic(TrackingRegionReader::new(width, height), params);
            let geometry = generator.geometry();
            let finest = generator.level_count() - 1;
            assert_eq!(geometry.level_dimensions(finest).unwrap(), (width, height));

            let mut total = 0u64;
            for level in 0..generator.level_count() {
                let (w, h) = geometry.level_dimensions(level).unwrap();
                let (cols, rows) = geometry.tile_grid(level).unwrap();
                assert_eq!(cols, w.div_ceil(params.tile_size));
                assert_eq!(rows, h.div_ceil(params.tile_size));
                total += u64::from(cols) * u64::from(rows);
            }
            assert_eq!(total, generator.tile_count());
        }
    }
}

#[test]
fn test_invalid_params_rejected() {
    let result = TilePyramidGenerator::new(
        TrackingRegionReader::new(100, 100),
        GenericLayout,
        TileParams::new(0, 0, 2),
    );
    assert!(matches!(result, Err(PyramidError::InvalidSpec(_))));

    let result = TilePyramidGenerator::new(
        TrackingRegionReader::new(100, 100),
        GenericLayout,
        TileParams::new(256, 0, 0),
    );
    assert!(matches!(result, Err(PyramidError::InvalidSpec(_))));

    let result = TilePyramidGenerator::new(
        TrackingRegionReader::new(0, 100),
        GenericLayout,
        TileParams::default(),
    );
    assert!(matches!(result, Err(PyramidError::InvalidSpec(_))));
}

// =============================================================================
// Region Requests
// =============================================================================

#[tokio::test]
async fn test_get_tile_requests_scaled_region() {
    let reader = TrackingRegionReader::new(1000, 1000);
    let generator = generic(reader.clone(), TileParams::new(256, 0, 2));

    let tile = generator
        .get_tile(1, 1, 0, PadMode::Constant, Interpolation::Optimise)
        .await
        .unwrap();
    assert_eq!(tile.dimensions(), (256, 256));

    let requests = reader.get_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].origin, (512.0, 0.0));
    assert_eq!(requests[0].size, (256, 256));
    assert_eq!(requests[0].resolution, 0.5);
}

#[tokio::test]
async fn test_overlap_shifts_window_outward() {
    let reader = TrackingRegionReader::new(1000, 1000);
    let generator = generic(reader.clone(), TileParams::new(254, 1, 2));
    let finest = generator.level_count() - 1;

    generator.get_tile_default(finest, 0, 0).await.unwrap();
    generator.get_tile_default(finest, 2, 1).await.unwrap();
    generator.get_tile_default(finest - 1, 1, 1).await.unwrap();

    let requests = reader.get_requests().await;
    assert_eq!(requests[0].origin, (-1.0, -1.0));
    assert_eq!(requests[0].size, (256, 256));
    assert_eq!(requests[1].origin, (507.0, 253.0));
    // 1 * 254 * 2 - 1 * 2
    assert_eq!(requests[2].origin, (506.0, 506.0));
    assert_eq!(requests[2].resolution, 0.5);
}

#[tokio::test]
async fn test_pad_and_interpolation_passed_through() {
    let reader = TrackingRegionReader::new(600, 400);
    let generator = generic(reader.clone(), TileParams::new(256, 0, 2));
    let finest = generator.level_count() - 1;

    generator
        .get_tile(finest, 2, 1, PadMode::Reflect, Interpolation::Lanczos)
        .await
        .unwrap();
    generator.get_tile_default(finest, 0, 0).await.unwrap();

    let requests = reader.get_requests().await;
    assert_eq!(requests[0].pad_mode, PadMode::Reflect);
    assert_eq!(requests[0].interpolation, Interpolation::Lanczos);
    assert_eq!(requests[1].pad_mode, PadMode::Constant);
    assert_eq!(requests[1].interpolation, Interpolation::Optimise);
}

#[tokio::test]
async fn test_out_of_range_never_reads() {
    let reader = TrackingRegionReader::new(1000, 1000);
    let generator = generic(reader.clone(), TileParams::new(256, 0, 2));

    // Origin (10 * 256, 10 * 256) lies beyond the slide on both axes
    let err = generator
        .get_tile(2, 10, 10, PadMode::Constant, Interpolation::Optimise)
        .await
        .unwrap_err();
    assert!(matches!(err, PyramidError::TileOutOfRange { level: 2, x: 10, y: 10 }));

    // Outside the grid on one axis only
    let err = generator.get_tile_default(2, 4, 0).await.unwrap_err();
    assert!(err.is_out_of_range());

    let err = generator.get_tile_default(3, 0, 0).await.unwrap_err();
    assert!(matches!(err, PyramidError::LevelOutOfRange { level: 3, level_count: 3 }));

    assert_eq!(reader.request_count(), 0);
}

#[tokio::test]
async fn test_read_failure_propagates() {
    let reader = TrackingRegionReader::new(1000, 1000).failing_after(0);
    let generator = generic(reader, TileParams::new(256, 0, 2));

    let err = generator.get_tile_default(0, 0, 0).await.unwrap_err();
    assert!(matches!(err, PyramidError::Read(ReadError::Io(_))));
}

#[tokio::test]
async fn test_overview_thumbnail_uses_lowest_detail_level() {
    let reader = TrackingRegionReader::new(4000, 2000).with_levels(3);
    let generator = generic(reader.clone(), TileParams::new(256, 0, 2));

    let thumbnail = generator.overview_thumbnail().await.unwrap();
    assert_eq!(thumbnail.dimensions(), (256, 128));

    // Computed once
    generator.overview_thumbnail().await.unwrap();
    assert_eq!(reader.level_read_count(), 1);
    assert_eq!(reader.request_count(), 0);
}

// =============================================================================
// Enumeration
// =============================================================================

#[test]
fn test_addresses_canonical_order() {
    let generator = generic(TrackingRegionReader::new(600, 300), TileParams::new(256, 0, 2));
    let addresses: Vec<TileAddress> = generator.addresses().collect();

    assert_eq!(addresses.len() as u64, generator.tile_count());
    let unique: HashSet<TileAddress> = addresses.iter().copied().collect();
    assert_eq!(unique.len(), addresses.len());

    // Level ascending, then rows, then columns
    let finest = generator.level_count() - 1;
    let last_level: Vec<(u32, u32)> = addresses
        .iter()
        .filter(|a| a.level == finest)
        .map(|a| (a.x, a.y))
        .collect();
    assert_eq!(last_level, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    assert!(addresses.windows(2).all(|w| w[0].level <= w[1].level));
}

#[tokio::test]
async fn test_tile_stream_is_lazy_and_restartable() {
    let reader = TrackingRegionReader::new(600, 300);
    let generator = generic(reader.clone(), TileParams::new(256, 0, 2));

    let mut tiles = Box::pin(generator.tiles());
    assert_eq!(reader.request_count(), 0);

    let first = tiles.next().await.unwrap().unwrap();
    assert_eq!(first.address, TileAddress::new(0, 0, 0));
    assert_eq!(reader.request_count(), 1);
    drop(tiles);

    let all: Vec<_> = generator.tiles().collect().await;
    assert_eq!(all.len() as u64, generator.tile_count());

    let streamed: Vec<TileAddress> = all.into_iter().map(|t| t.unwrap().address).collect();
    let expected: Vec<TileAddress> = generator.addresses().collect();
    assert_eq!(streamed, expected);
}

#[tokio::test]
async fn test_tile_stream_stops_on_error() {
    // Only the third read fails; later reads would succeed
    let reader = TrackingRegionReader::new(1000, 1000).failing_once_at(2);
    let generator = generic(reader.clone(), TileParams::new(256, 0, 2));
    assert_eq!(generator.tile_count(), 21);

    let results: Vec<_> = generator.tiles().collect().await;
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(PyramidError::Read(ReadError::Io(_)))));
    assert_eq!(reader.request_count(), 3);

    // A new stream starts over from the first tile
    let results: Vec<_> = generator.tiles().collect().await;
    assert_eq!(results.len() as u64, generator.tile_count());
    assert!(results.iter().all(|r| r.is_ok()));
}

// =============================================================================
// Paths
// =============================================================================

#[tokio::test]
async fn test_generic_layout_has_no_paths() {
    let reader = TrackingRegionReader::new(1000, 1000);
    let generator = generic(reader.clone(), TileParams::default());

    let err = generator.tile_path(0, 0, 0).unwrap_err();
    assert!(matches!(err, PyramidError::PathsUnavailable { .. }));

    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("generic");
    let err = generator.dump_with(&destination, None, None).await.unwrap_err();
    assert!(err.is_config());
    assert!(!destination.exists());
    assert_eq!(reader.request_count(), 0);
}
