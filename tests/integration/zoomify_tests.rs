//! Zoomify integration tests.
//!
//! Tests verify:
//! - Tile groups follow the running tile number across levels
//! - Tile paths carry their group
//! - Zoomify tiles are plain (non-overlapping) 256 pixel tiles

use wsi_pyramid::layout::{ZoomifyLayout, ZOOMIFY_TILE_GROUP_SIZE};
use wsi_pyramid::slide::PadMode;
use wsi_pyramid::tile::{TilePyramidGenerator, ZoomifyGenerator};

use super::test_utils::TrackingRegionReader;

fn zoomify(reader: TrackingRegionReader) -> ZoomifyGenerator<TrackingRegionReader> {
    TilePyramidGenerator::with_defaults(reader, ZoomifyLayout).unwrap()
}

#[test]
fn test_tile_group_boundary() {
    let generator = zoomify(TrackingRegionReader::new(4096, 4096));

    // 1 + 4 + 16 + 64 tiles precede level 4
    assert_eq!(generator.level_count(), 5);
    assert_eq!(generator.geometry().tiles_before(4).unwrap(), 85);

    assert_eq!(generator.tile_group(4, 10, 10).unwrap(), 0);
    assert_eq!(generator.tile_group(4, 11, 10).unwrap(), 1);
    assert_eq!(&*generator.tile_path(4, 10, 10).unwrap(), "TileGroup0/4-10-10.jpg");
    assert_eq!(&*generator.tile_path(4, 11, 10).unwrap(), "TileGroup1/4-11-10.jpg");
}

#[test]
fn test_tile_groups_follow_enumeration() {
    let generator = zoomify(TrackingRegionReader::new(8192, 8192));
    assert_eq!(generator.tile_count(), 1365);

    for (index, address) in generator.addresses().enumerate() {
        let group = generator
            .tile_group(address.level, address.x, address.y)
            .unwrap();
        assert_eq!(group, index as u64 / ZOOMIFY_TILE_GROUP_SIZE);
    }
}

#[test]
fn test_group_changes_at_257th_tile() {
    let generator = zoomify(TrackingRegionReader::new(8192, 8192));

    let last_of_first = generator.addresses().nth(255).unwrap();
    let first_of_second = generator.addresses().nth(256).unwrap();

    let path = generator
        .tile_path(last_of_first.level, last_of_first.x, last_of_first.y)
        .unwrap();
    assert!(path.starts_with("TileGroup0/"));

    let path = generator
        .tile_path(first_of_second.level, first_of_second.x, first_of_second.y)
        .unwrap();
    assert!(path.starts_with("TileGroup1/"));
}

#[test]
fn test_out_of_grid_has_no_group() {
    let generator = zoomify(TrackingRegionReader::new(4096, 4096));
    assert!(generator.tile_group(4, 16, 0).unwrap_err().is_out_of_range());
    assert!(generator.tile_group(5, 0, 0).unwrap_err().is_out_of_range());
}

#[tokio::test]
async fn test_default_tiles() {
    let reader = TrackingRegionReader::new(1000, 600);
    let generator = zoomify(reader.clone());
    let finest = generator.level_count() - 1;

    let tile = generator.get_tile_default(finest, 3, 2).await.unwrap();
    assert_eq!(tile.dimensions(), (256, 256));

    let requests = reader.get_requests().await;
    assert_eq!(requests[0].origin, (768.0, 512.0));
    assert_eq!(requests[0].pad_mode, PadMode::Constant);
}
