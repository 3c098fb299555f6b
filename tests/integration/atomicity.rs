//! Cache writes never leave partial entries behind

use super::test_utils::{config, files_under, pipeline, write_png};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use thumbcache::cache::{CacheLayout, TEMP_PREFIX};
use thumbcache::fingerprint::fingerprint_file;
use thumbcache::metadata::MemoryStore;
use thumbcache::types::Resolution;

fn is_temp(path: &std::path::Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(TEMP_PREFIX))
}

#[test]
fn test_successful_run_leaves_no_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input");
    for i in 0..4 {
        write_png(&input.join(format!("{}.png", i)), 50 + i, 40);
    }

    let store = Arc::new(MemoryStore::new());
    let cache_root = temp_dir.path().join("cache");
    pipeline(&cache_root, &config(&[16, 32], CacheLayout::Flat, 2), &store).run([&input]);

    let files = files_under(&cache_root);
    assert_eq!(files.len(), 8);
    assert!(files.iter().all(|f| !is_temp(f)));
    assert!(files.iter().all(|f| f.extension().is_some_and(|e| e == "jpg")));
}

#[test]
fn test_interrupted_write_is_redone_on_next_run() {
    let temp_dir = TempDir::new().unwrap();
    let image = write_png(&temp_dir.path().join("img.png"), 64, 48);
    let fingerprint = fingerprint_file(&image).unwrap();

    // What a killed run leaves behind: a partial temp file, no entry
    let cache_root = temp_dir.path().join("cache");
    let resolution_dir = cache_root.join("32");
    fs::create_dir_all(&resolution_dir).unwrap();
    let stray = resolution_dir.join(format!("{}abc123.part", TEMP_PREFIX));
    fs::write(&stray, b"\xff\xd8\xff partial").unwrap();

    let store = Arc::new(MemoryStore::new());
    let p = pipeline(&cache_root, &config(&[32], CacheLayout::Flat, 1), &store);
    let resolution = Resolution::new(32).unwrap();
    assert!(!p.cache().contains(&fingerprint, resolution));

    let summary = p.run([&image]);
    assert_eq!(summary.generated, 1);

    let entry = p.cache().entry_path(&fingerprint, resolution);
    assert_eq!(image::image_dimensions(&entry).unwrap(), (32, 24));
    assert!(image::open(&entry).is_ok());
}
