//! Shared test utilities for integration tests
//!
//! Fixture rendering, pipeline construction and environment isolation.

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use thumbcache::cache::CacheLayout;
use thumbcache::config::ThumbConfig;
use thumbcache::metadata::MemoryStore;
use thumbcache::pipeline::Pipeline;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 3] = ["HOME", "XDG_CONFIG_HOME", "THUMBCACHE__CACHE__ROOT"];

/// Render a gradient PNG of the given size
pub fn write_png(path: &Path, width: u32, height: u32) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
    .save(path)
    .unwrap();
    path.to_path_buf()
}

/// Configuration with the given resolutions and layout
pub fn config(resolutions: &[u32], layout: CacheLayout, workers: usize) -> ThumbConfig {
    let mut config = ThumbConfig::default();
    config.cache.resolutions = resolutions.to_vec();
    config.cache.layout = layout;
    config.workers = workers;
    config
}

/// Pipeline writing to `cache_root`, persisting fingerprints in `store`
pub fn pipeline(cache_root: &Path, config: &ThumbConfig, store: &Arc<MemoryStore>) -> Pipeline {
    Pipeline::new(config, cache_root.to_path_buf(), Box::new(Arc::clone(store))).unwrap()
}

/// Every regular file below `root`, sorted
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Run `f` with `HOME` and `XDG_CONFIG_HOME` pointed into `test_dir`
///
/// Original values are restored afterwards; a global mutex keeps parallel
/// tests from observing each other's environment.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<_> = ISOLATED_VARS
        .iter()
        .map(|var| (*var, std::env::var(var).ok()))
        .collect();

    let test_home = test_dir.path().join("home");
    let test_config_home = test_dir.path().join("config");
    std::fs::create_dir_all(&test_home).unwrap();
    std::fs::create_dir_all(&test_config_home).unwrap();

    std::env::remove_var("THUMBCACHE__CACHE__ROOT");
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);

    let result = f();

    for (var, value) in saved {
        match value {
            Some(value) => std::env::set_var(var, value),
            None => std::env::remove_var(var),
        }
    }

    result
}

/// Run `f` with `HOME` unset
pub fn without_home<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original_home = std::env::var("HOME").ok();
    std::env::remove_var("HOME");

    let result = f();

    if let Some(home) = original_home {
        std::env::set_var("HOME", home);
    }
    result
}

/// Whether the filesystem under `dir` accepts user extended attributes
pub fn xattrs_supported(dir: &std::path::Path) -> bool {
    use thumbcache::error::MetadataError;
    use thumbcache::metadata::{MetadataStore, XattrStore, MTIME_KEY};

    let marker = dir.join(".xattr-check");
    std::fs::write(&marker, b"x").unwrap();
    let supported = match XattrStore::new().set(&marker, MTIME_KEY, "0") {
        Ok(()) => true,
        Err(MetadataError::Unsupported(_)) => false,
        Err(e) => panic!("xattr write failed on a regular file: {}", e),
    };
    std::fs::remove_file(&marker).unwrap();
    supported
}
