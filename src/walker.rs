//! Filesystem walker yielding candidate image files

use crate::error::ThumbError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extensions accepted by default (matched case-sensitively)
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

/// Walker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Allowed file extensions, with or without a leading dot
    #[serde(
        default = "default_extensions",
        deserialize_with = "crate::config::one_or_many"
    )]
    pub extensions: Vec<String>,
    /// Whether to follow symbolic links
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            follow_symlinks: default_true(),
        }
    }
}

impl WalkerConfig {
    /// Whether `path` carries an allowed extension
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.') == ext)
    }
}

/// Lazy, depth-first walk over one or more roots
///
/// Directory entries are visited in lexical order by file name, so a rerun over
/// an unchanged tree yields the same sequence. A root that is a regular file is
/// yielded directly when its extension is allowed. Enumeration failures skip the
/// affected subtree only.
pub struct Walker {
    roots: VecDeque<PathBuf>,
    current: Option<walkdir::IntoIter>,
    config: WalkerConfig,
    enumeration_errors: usize,
}

impl Walker {
    pub fn new<I, P>(roots: I, config: WalkerConfig) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            current: None,
            config,
            enumeration_errors: 0,
        }
    }

    /// Number of enumeration failures seen so far
    pub fn enumeration_errors(&self) -> usize {
        self.enumeration_errors
    }

    fn record_error(&mut self, err: walkdir::Error) {
        let err = ThumbError::DirectoryEnumeration {
            path: err.path().map(Path::to_path_buf).unwrap_or_default(),
            message: err.to_string(),
        };
        warn!(error = %err, "Skipping unreadable subtree");
        self.enumeration_errors += 1;
    }
}

impl Iterator for Walker {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if self.current.is_none() {
                let root = self.roots.pop_front()?;
                self.current = Some(
                    WalkDir::new(root)
                        .follow_links(self.config.follow_symlinks)
                        .sort_by_file_name()
                        .into_iter(),
                );
            }

            let Some(entries) = self.current.as_mut() else {
                continue;
            };

            match entries.next() {
                None => self.current = None,
                Some(Err(e)) => self.record_error(e),
                Some(Ok(entry)) => {
                    if entry.file_type().is_file() && self.config.accepts(entry.path()) {
                        return Some(entry.into_path());
                    }
                }
            }
        }
    }
}
