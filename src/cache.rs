//! Content-addressed thumbnail storage
//!
//! Entries are stored at paths derived from `(fingerprint, resolution)`:
//!
//! - flat:    `{root}/{resolution}/{fingerprint}.jpg`
//! - sharded: `{root}/{resolution}/{hex[0..2]}/{hex[2..]}.jpg`
//!
//! Existence of the final path is the only record that an entry was built, so
//! writes go to a temporary file in the destination directory and are renamed
//! into place. A killed run can leave a stray temp file behind, never a
//! truncated entry.

use crate::error::ThumbError;
use crate::types::{Fingerprint, Resolution};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Thumbnail file extension
pub const ENTRY_EXTENSION: &str = "jpg";

/// Prefix of in-flight temporary files
pub const TEMP_PREFIX: &str = ".tmp-";

/// Directory layout under the cache root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheLayout {
    /// One directory per resolution
    #[default]
    Flat,
    /// Additional level keyed by the first two hex characters
    Sharded,
}

/// Thumbnail cache rooted at a directory
#[derive(Debug, Clone)]
pub struct ThumbnailCache {
    root: PathBuf,
    layout: CacheLayout,
}

impl ThumbnailCache {
    /// The root directory is created lazily on first write
    pub fn new<P: AsRef<Path>>(root: P, layout: CacheLayout) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic path of the entry for `(fingerprint, resolution)`
    pub fn entry_path(&self, fingerprint: &Fingerprint, resolution: Resolution) -> PathBuf {
        let hex = fingerprint.to_hex();
        let dir = self.root.join(resolution.to_string());
        match self.layout {
            CacheLayout::Flat => dir.join(format!("{}.{}", hex, ENTRY_EXTENSION)),
            CacheLayout::Sharded => dir
                .join(&hex[..2])
                .join(format!("{}.{}", &hex[2..], ENTRY_EXTENSION)),
        }
    }

    /// Whether an entry already exists
    pub fn contains(&self, fingerprint: &Fingerprint, resolution: Resolution) -> bool {
        self.entry_path(fingerprint, resolution).is_file()
    }

    /// Atomically store `bytes` as the entry for `(fingerprint, resolution)`
    ///
    /// Concurrent writers of the same entry are safe: each renames its own temp
    /// file and the last rename wins.
    pub fn write_atomic(
        &self,
        fingerprint: &Fingerprint,
        resolution: Resolution,
        bytes: &[u8],
    ) -> Result<PathBuf, ThumbError> {
        let entry_path = self.entry_path(fingerprint, resolution);
        let write_error = |source| ThumbError::CacheWrite {
            path: entry_path.clone(),
            source,
        };

        let parent = entry_path
            .parent()
            .ok_or_else(|| write_error(std::io::Error::other("Cache entry has no parent directory")))?;
        fs::create_dir_all(parent).map_err(write_error)?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(write_error)?;
        temp.write_all(bytes).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;

        persist(temp, &entry_path).map_err(write_error)?;
        Ok(entry_path)
    }
}

fn persist(temp: NamedTempFile, destination: &Path) -> std::io::Result<()> {
    // On failure the temp file is dropped and removed
    temp.persist(destination).map(|_| ()).map_err(|e| e.error)
}
