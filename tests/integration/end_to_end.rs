//! End-to-end runs over a small tree of images

use super::test_utils::{config, files_under, pipeline, write_png};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use thumbcache::cache::CacheLayout;
use thumbcache::fingerprint::fingerprint_file;
use thumbcache::metadata::{MemoryStore, MetadataStore, FINGERPRINT_KEY};
use thumbcache::types::Resolution;

fn res(pixels: u32) -> Resolution {
    Resolution::new(pixels).unwrap()
}

#[test]
fn test_landscape_image_generates_every_resolution() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("photos");
    let image = write_png(&input.join("wide.png"), 2000, 1000);
    fs::write(input.join("notes.txt"), "not an image").unwrap();

    let store = Arc::new(MemoryStore::new());
    let cache_root = temp_dir.path().join("cache");
    let p = pipeline(
        &cache_root,
        &config(&[16, 64, 256, 1024], CacheLayout::Flat, 1),
        &store,
    );
    let summary = p.run([&input]);

    assert_eq!(summary.files, 1);
    assert_eq!(summary.generated, 4);
    assert_eq!(summary.failed_files(), 0);

    let fingerprint = fingerprint_file(&image).unwrap();
    for (resolution, expected) in [(1024, (1024, 512)), (256, (256, 128)), (64, (64, 32)), (16, (16, 8))] {
        let entry = cache_root
            .join(resolution.to_string())
            .join(format!("{}.jpg", fingerprint));
        assert_eq!(entry, p.cache().entry_path(&fingerprint, res(resolution)));
        assert_eq!(image::image_dimensions(&entry).unwrap(), expected);
    }
    assert_eq!(files_under(&cache_root).len(), 4);

    let stored = store.get(&image, FINGERPRINT_KEY).unwrap();
    assert_eq!(stored, Some(fingerprint.to_hex()));
}

#[test]
fn test_resolution_larger_than_image_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_png(&temp_dir.path().join("in").join("wide.png"), 2000, 1000);

    let store = Arc::new(MemoryStore::new());
    let cache_root = temp_dir.path().join("cache");
    let p = pipeline(
        &cache_root,
        &config(&[16, 64, 256, 1024, 2048], CacheLayout::Flat, 1),
        &store,
    );
    let summary = p.run([&image]);

    assert_eq!(summary.generated, 4);
    assert_eq!(summary.too_small, 1);

    let fingerprint = fingerprint_file(&image).unwrap();
    assert!(!p.cache().contains(&fingerprint, res(2048)));
    assert!(!cache_root.join("2048").exists());
}

#[test]
fn test_portrait_image_constrains_height() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_png(&temp_dir.path().join("tall.png"), 300, 600);

    let store = Arc::new(MemoryStore::new());
    let p = pipeline(
        &temp_dir.path().join("cache"),
        &config(&[100], CacheLayout::Flat, 1),
        &store,
    );
    p.run([&image]);

    let fingerprint = fingerprint_file(&image).unwrap();
    let entry = p.cache().entry_path(&fingerprint, res(100));
    assert_eq!(image::image_dimensions(entry).unwrap(), (50, 100));
}

#[test]
fn test_bad_files_do_not_stop_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    write_png(&input.join("a.png"), 64, 64);
    fs::write(input.join("b.jpg"), b"\xff\xd8 truncated").unwrap();
    write_png(&input.join("nested").join("c.png"), 64, 32);

    let store = Arc::new(MemoryStore::new());
    let p = pipeline(
        &temp_dir.path().join("cache"),
        &config(&[32], CacheLayout::Flat, 1),
        &store,
    );
    let summary = p.run([input.clone(), temp_dir.path().join("missing")]);

    assert_eq!(summary.files, 3);
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.decode_errors, 1);
    assert_eq!(summary.enumeration_errors, 1);
}
