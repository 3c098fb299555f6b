//! Error types for the thumbnail cache builder.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline errors
///
/// Everything except `Configuration` is recovered per file (or per subtree)
/// by the pipeline; configuration errors abort before any processing.
#[derive(Debug, Error)]
pub enum ThumbError {
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode thumbnail for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write cache entry {path:?}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to enumerate {path:?}: {message}")]
    DirectoryEnumeration { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ThumbError {
    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ThumbError::Configuration(_))
    }
}

impl From<config::ConfigError> for ThumbError {
    fn from(err: config::ConfigError) -> Self {
        ThumbError::Configuration(err.to_string())
    }
}

/// Out-of-band metadata errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Extended attributes are not supported for {0:?}")]
    Unsupported(PathBuf),

    #[error("Metadata I/O error: {0}")]
    Io(#[from] std::io::Error),
}
