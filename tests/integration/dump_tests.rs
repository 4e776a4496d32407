//! Dump integration tests.
//!
//! Tests verify:
//! - Directory, ZIP and TAR output hold every tile, in canonical order
//! - Edge tiles of Deep Zoom pyramids are cropped to the image
//! - Invalid container options fail before any I/O
//! - Cancellation and reader failures abort the dump

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wsi_pyramid::container::{Compression, ContainerKind, ContainerSpec};
use wsi_pyramid::error::PyramidError;
use wsi_pyramid::layout::{DeepZoomLayout, ZoomifyLayout};
use wsi_pyramid::slide::RegionReader;
use wsi_pyramid::tile::{DumpOptions, TilePyramidGenerator};

use super::test_utils::{gradient_reader, is_valid_jpeg, TrackingRegionReader};

fn expected_paths<R: RegionReader, L: wsi_pyramid::layout::NamingStrategy>(
    generator: &TilePyramidGenerator<R, L>,
) -> Vec<String> {
    generator
        .addresses()
        .map(|a| generator.tile_path(a.level, a.x, a.y).unwrap().to_string())
        .collect()
}

fn zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files
}

// =============================================================================
// Directory
// =============================================================================

#[tokio::test]
async fn test_deepzoom_directory_dump() {
    let reader = gradient_reader(300, 200);
    let generator = TilePyramidGenerator::with_defaults(reader, DeepZoomLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("slide_files");

    let summary = generator.dump(&root, &DumpOptions::default()).await.unwrap();
    assert_eq!(summary.tiles_written, 10);
    assert_eq!(summary.level_count, 9);

    for path in expected_paths(&generator) {
        assert!(root.join(&path).is_file(), "missing {}", path);
    }

    // Edge tiles are cropped, not padded
    let dims = |p: &str| image::image_dimensions(root.join(p)).unwrap();
    assert_eq!(dims("8/0_0.jpg"), (255, 200));
    assert_eq!(dims("8/1_0.jpg"), (47, 200));
    assert_eq!(dims("7/0_0.jpg"), (128, 85));
    assert_eq!(dims("0/0_0.jpg"), (1, 1));

    let data = std::fs::read(root.join("8/0_0.jpg")).unwrap();
    assert!(is_valid_jpeg(&data));
}

#[tokio::test]
async fn test_existing_directory_is_rejected() {
    let reader = TrackingRegionReader::new(600, 400);
    let generator = TilePyramidGenerator::with_defaults(reader.clone(), ZoomifyLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();

    let err = generator
        .dump(temp.path(), &DumpOptions::default())
        .await
        .unwrap_err();
    match err {
        PyramidError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists),
        other => panic!("expected an I/O error, got {:?}", other),
    }
    assert_eq!(reader.request_count(), 0);
}

// =============================================================================
// Archives
// =============================================================================

#[tokio::test]
async fn test_zoomify_zip_dump() {
    let reader = gradient_reader(600, 400);
    let generator = TilePyramidGenerator::with_defaults(reader, ZoomifyLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("slide.zip");

    let summary = generator
        .dump_with(&path, Some("zip"), Some("deflate"))
        .await
        .unwrap();
    assert_eq!(summary.tiles_written, generator.tile_count());

    let entries = zip_entries(&path);
    let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(names, expected_paths(&generator));
    assert_eq!(names[0], "TileGroup0/0-0-0.jpg");
    assert!(entries.iter().all(|(_, data)| is_valid_jpeg(data)));
}

#[tokio::test]
async fn test_zip_bz2_and_lzma_dumps() {
    let reader = gradient_reader(600, 400);
    let generator = TilePyramidGenerator::with_defaults(reader, ZoomifyLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();

    for compression in ["bz2", "lzma"] {
        let path = temp.path().join(format!("slide-{}.zip", compression));
        let summary = generator
            .dump_with(&path, Some("zip"), Some(compression))
            .await
            .unwrap();
        assert_eq!(summary.tiles_written, generator.tile_count());

        let entries = zip_entries(&path);
        let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        assert_eq!(names, expected_paths(&generator));
        assert!(entries.iter().all(|(_, data)| is_valid_jpeg(data)));
    }
}

#[tokio::test]
async fn test_deepzoom_tar_gzip_dump() {
    let reader = gradient_reader(300, 200);
    let generator = TilePyramidGenerator::with_defaults(reader, DeepZoomLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("slide.tar.gz");

    let container = ContainerSpec::new(ContainerKind::Tar, Compression::Gzip).unwrap();
    generator
        .dump(&path, &DumpOptions::new(container))
        .await
        .unwrap();

    let decoder = flate2::read::GzDecoder::new(File::open(&path).unwrap());
    let mut archive = tar::Archive::new(decoder);
    let mut names = Vec::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        assert_eq!(entry.header().mode().unwrap(), 0o644);
        names.push(entry.path().unwrap().to_string_lossy().into_owned());

        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        assert!(is_valid_jpeg(&data));
    }
    assert_eq!(names, expected_paths(&generator));
}

#[tokio::test]
async fn test_invalid_combination_fails_before_io() {
    let reader = TrackingRegionReader::new(1000, 1000);
    let generator = TilePyramidGenerator::with_defaults(reader.clone(), DeepZoomLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("slide.zip");

    let err = generator
        .dump_with(&path, Some("zip"), Some("gzip"))
        .await
        .unwrap_err();
    assert!(err.is_config());

    let err = generator
        .dump_with(&path, Some("rar"), None)
        .await
        .unwrap_err();
    assert!(err.is_config());

    assert!(!path.exists());
    assert_eq!(reader.request_count(), 0);
    assert_eq!(reader.level_read_count(), 0);
}

#[tokio::test]
async fn test_concurrency_keeps_order() {
    let reader = TrackingRegionReader::new(1500, 900);
    let generator = TilePyramidGenerator::with_defaults(reader, ZoomifyLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();

    let mut listings = Vec::new();
    for concurrency in [1, 4] {
        let path = temp.path().join(format!("slide-{}.zip", concurrency));
        let container = ContainerSpec::new(ContainerKind::Zip, Compression::None).unwrap();
        let options = DumpOptions::new(container).with_concurrency(concurrency);
        generator.dump(&path, &options).await.unwrap();

        let names: Vec<String> = zip_entries(&path).into_iter().map(|(name, _)| name).collect();
        listings.push(names);
    }

    assert_eq!(listings[0], listings[1]);
    assert_eq!(listings[0], expected_paths(&generator));
}

// =============================================================================
// Aborted Dumps
// =============================================================================

#[tokio::test]
async fn test_cancelled_dump() {
    let reader = TrackingRegionReader::new(1000, 1000);
    let generator = TilePyramidGenerator::with_defaults(reader, ZoomifyLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();

    let options = DumpOptions::default().with_cancel_flag(Arc::new(AtomicBool::new(true)));
    let err = generator
        .dump(temp.path().join("out"), &options)
        .await
        .unwrap_err();
    assert!(matches!(err, PyramidError::Cancelled { written: 0 }));
}

#[tokio::test]
async fn test_cancelled_mid_dump() {
    let flag = Arc::new(AtomicBool::new(false));
    let reader = TrackingRegionReader::new(2000, 2000).cancelling_after(10, Arc::clone(&flag));
    let generator = TilePyramidGenerator::with_defaults(reader, ZoomifyLayout).unwrap();
    assert_eq!(generator.tile_count(), 85);

    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("out");
    let options = DumpOptions::default()
        .with_concurrency(4)
        .with_cancel_flag(Arc::clone(&flag));

    let err = generator.dump(&root, &options).await.unwrap_err();
    let written = match err {
        PyramidError::Cancelled { written } => written,
        other => panic!("expected cancellation, got {:?}", other),
    };
    assert!(flag.load(Ordering::SeqCst));

    // The tenth tile raised the flag before its result was written
    assert!(written < 10);
    assert_eq!(files_under(&root).len() as u64, written);
}

#[tokio::test]
async fn test_read_failure_aborts_dump() {
    let reader = TrackingRegionReader::new(1000, 1000).failing_after(3);
    let generator = TilePyramidGenerator::with_defaults(reader.clone(), ZoomifyLayout).unwrap();
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("out");

    let err = generator
        .dump(&root, &DumpOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PyramidError::Read(_)));

    // Tiles rendered before the failure were written
    assert!(root.join("TileGroup0/0-0-0.jpg").is_file());
    assert!(!root.join("TileGroup0/2-0-0.jpg").exists());
}
