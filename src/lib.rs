//! Thumbcache: Content-Addressed Thumbnail Cache
//!
//! Walks trees of image files and builds resized JPEG thumbnails at several
//! resolutions, keyed by a fingerprint of each file's content. Fingerprints are
//! cached as out-of-band file metadata so unchanged files are not re-hashed, and
//! existing cache entries are never regenerated.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod thumbnail;
pub mod types;
pub mod walker;
