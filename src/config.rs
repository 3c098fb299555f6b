//! Configuration System
//!
//! Layered configuration: built-in defaults, then the global config file, then
//! `THUMBCACHE__*` environment variables. The resolved [`ThumbConfig`] is passed
//! explicitly to every component; nothing reads the environment after startup.

use crate::cache::CacheLayout;
use crate::error::ThumbError;
use crate::logging::LoggingConfig;
use crate::metadata::MetadataBackend;
use crate::thumbnail::{ResizeFilter, DEFAULT_QUALITY};
use crate::types::{ResolutionSet, DEFAULT_RESOLUTIONS};
use crate::walker::WalkerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod loader;
mod sources;

pub use loader::ConfigLoader;
pub(crate) use sources::environment::one_or_many;
pub use sources::global_file::global_config_path;

/// Serializes environment mutation across unit tests
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Directory under `$HOME` used when no cache root is configured
pub const DEFAULT_CACHE_DIR: &str = ".thumbcache";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbConfig {
    /// Thumbnail cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Tree walk settings
    #[serde(default)]
    pub walk: WalkerConfig,

    /// Number of files processed concurrently (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_workers() -> usize {
    1
}

impl Default for ThumbConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            walk: WalkerConfig::default(),
            workers: default_workers(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Thumbnail cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache root; defaults to `$HOME/.thumbcache`
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub layout: CacheLayout,

    /// JPEG quality, 1-100
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Longest-edge sizes to generate
    #[serde(default = "default_resolutions", deserialize_with = "one_or_many")]
    pub resolutions: Vec<u32>,

    #[serde(default)]
    pub filter: ResizeFilter,

    /// Where fingerprints are persisted
    #[serde(default)]
    pub metadata: MetadataBackend,
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

fn default_resolutions() -> Vec<u32> {
    DEFAULT_RESOLUTIONS.to_vec()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            layout: CacheLayout::default(),
            quality: default_quality(),
            resolutions: default_resolutions(),
            filter: ResizeFilter::default(),
            metadata: MetadataBackend::default(),
        }
    }
}

impl CacheConfig {
    /// Resolve the cache root, falling back to `$HOME/.thumbcache`
    pub fn resolve_root(&self) -> Result<PathBuf, ThumbError> {
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }

        match std::env::var("HOME") {
            Ok(home) if !home.is_empty() => Ok(PathBuf::from(home).join(DEFAULT_CACHE_DIR)),
            _ => Err(ThumbError::Configuration(
                "Couldn't find $HOME environment variable to locate the thumbnail cache".to_string(),
            )),
        }
    }

    /// Resolutions as an ordered set
    pub fn resolution_set(&self) -> Result<ResolutionSet, ThumbError> {
        ResolutionSet::new(&self.resolutions)
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.quality) {
            return Err(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.quality
            ));
        }
        if self.resolutions.is_empty() {
            return Err("At least one resolution is required".to_string());
        }
        if self.resolutions.contains(&0) {
            return Err("Resolutions must be non-zero".to_string());
        }
        if matches!(&self.root, Some(root) if root.as_os_str().is_empty()) {
            return Err("Cache root cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Cache(String),
    Walk(String),
    System(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Cache(msg) => write!(f, "Cache: {}", msg),
            ValidationError::Walk(msg) => write!(f, "Walk: {}", msg),
            ValidationError::System(msg) => write!(f, "System: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ThumbConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.cache.validate() {
            errors.push(ValidationError::Cache(e));
        }

        if self.walk.extensions.is_empty() {
            errors.push(ValidationError::Walk(
                "At least one file extension is required".to_string(),
            ));
        }
        if self.walk.extensions.iter().any(|e| e.trim_start_matches('.').is_empty()) {
            errors.push(ValidationError::Walk(
                "File extensions cannot be empty".to_string(),
            ));
        }

        if self.workers == 0 {
            errors.push(ValidationError::System(
                "workers must be at least 1".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding all problems into one configuration error
    pub fn ensure_valid(&self) -> Result<(), ThumbError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ThumbError::Configuration(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
