//! Configuration driving a full run

use super::test_utils::{files_under, with_isolated_env, without_home, write_png};
use std::fs;
use tempfile::TempDir;
use thumbcache::config::{global_config_path, ConfigLoader, ThumbConfig, DEFAULT_CACHE_DIR};
use thumbcache::error::ThumbError;
use thumbcache::pipeline::Pipeline;

#[test]
fn test_config_file_drives_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let cache_root = temp_dir.path().join("thumbs");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[cache]
root = "{}"
layout = "sharded"
resolutions = [24]
metadata = "none"
"#,
            cache_root.display()
        ),
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    let image = write_png(&temp_dir.path().join("in").join("a.png"), 48, 48);
    let summary = Pipeline::from_config(&config).unwrap().run([&image]);

    assert_eq!(summary.generated, 1);
    let files = files_under(&cache_root);
    assert_eq!(files.len(), 1);
    // {root}/24/{xx}/{rest}.jpg
    assert_eq!(files[0].strip_prefix(&cache_root).unwrap().components().count(), 3);
}

#[test]
fn test_global_config_file_is_discovered() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_isolated_env(&temp_dir, || {
        let path = global_config_path().unwrap();
        assert_eq!(path, temp_dir.path().join("config").join("thumbcache").join("config.toml"));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "workers = 3\n[walk]\nextensions = [\"png\"]\n").unwrap();
        ConfigLoader::load().unwrap()
    });

    assert_eq!(config.workers, 3);
    assert_eq!(config.walk.extensions, vec!["png".to_string()]);
}

#[test]
fn test_cache_root_defaults_under_home() {
    let temp_dir = TempDir::new().unwrap();
    let root = with_isolated_env(&temp_dir, || {
        let config = ConfigLoader::load().unwrap();
        config.cache.resolve_root().unwrap()
    });
    assert_eq!(root, temp_dir.path().join("home").join(DEFAULT_CACHE_DIR));
}

#[test]
fn test_missing_home_is_fatal() {
    let err = without_home(|| Pipeline::from_config(&ThumbConfig::default()).err());
    let err = err.expect("pipeline should not start without a cache root");
    assert!(matches!(err, ThumbError::Configuration(_)));
    assert!(err.is_fatal());
}
