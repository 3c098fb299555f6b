//! Out-of-band file metadata
//!
//! Fingerprints are cached alongside source files as name/value attributes that
//! live outside the file's byte stream. The [`MetadataStore`] trait is the seam:
//! extended attributes on filesystems that support them, an always-miss store
//! everywhere else, and an in-memory store for tests.

use crate::error::MetadataError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Attribute holding the hex fingerprint
pub const FINGERPRINT_KEY: &str = "fingerprint";
/// Attribute holding the source mtime (Unix seconds) seen when hashing
pub const MTIME_KEY: &str = "mtime";
/// Attribute holding the resize filter label of this cache generation
pub const FILTER_KEY: &str = "filter";

/// Namespace prefix for extended attributes
pub const XATTR_NAMESPACE: &str = "user.thumbcache.";

/// Capability interface for out-of-band metadata
pub trait MetadataStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    fn get(&self, path: &Path, key: &str) -> Result<Option<String>, MetadataError>;

    /// Write a value, replacing any previous one
    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), MetadataError>;
}

/// Which metadata backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// Filesystem extended attributes
    #[default]
    Xattr,
    /// Never cache fingerprints
    None,
}

impl MetadataBackend {
    /// Build the store for this backend
    ///
    /// Falls back to [`NullStore`] on platforms without extended attributes.
    pub fn build(self) -> Box<dyn MetadataStore> {
        match self {
            MetadataBackend::Xattr if xattr::SUPPORTED_PLATFORM => Box::new(XattrStore::new()),
            _ => Box::new(NullStore),
        }
    }
}

/// Extended-attribute store (`user.thumbcache.<key>`)
///
/// Symlinks are dereferenced: attributes land on the target file, since Linux
/// refuses `user.*` attributes on the link itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrStore;

impl XattrStore {
    pub fn new() -> Self {
        Self
    }

    fn attr_name(&self, key: &str) -> String {
        format!("{}{}", XATTR_NAMESPACE, key)
    }

    fn map_error(path: &Path, err: std::io::Error) -> MetadataError {
        if is_unsupported(&err) {
            MetadataError::Unsupported(path.to_path_buf())
        } else {
            MetadataError::Io(err)
        }
    }
}

impl MetadataStore for XattrStore {
    fn get(&self, path: &Path, key: &str) -> Result<Option<String>, MetadataError> {
        let value = xattr::get_deref(path, self.attr_name(key)).map_err(|e| Self::map_error(path, e))?;
        Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), MetadataError> {
        xattr::set_deref(path, self.attr_name(key), value.as_bytes())
            .map_err(|e| Self::map_error(path, e))
    }
}

#[cfg(unix)]
fn is_unsupported(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::Unsupported
        || matches!(err.raw_os_error(), Some(code) if code == libc::ENOTSUP || code == libc::EOPNOTSUPP)
}

#[cfg(not(unix))]
fn is_unsupported(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::Unsupported
}

/// Always-miss store; writes are discarded
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl MetadataStore for NullStore {
    fn get(&self, _path: &Path, _key: &str) -> Result<Option<String>, MetadataError> {
        Ok(None)
    }

    fn set(&self, _path: &Path, _key: &str, _value: &str) -> Result<(), MetadataError> {
        Ok(())
    }
}

/// In-process store keyed by (path, key)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(PathBuf, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values across all paths
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl MetadataStore for MemoryStore {
    fn get(&self, path: &Path, key: &str) -> Result<Option<String>, MetadataError> {
        Ok(self
            .entries
            .lock()
            .get(&(path.to_path_buf(), key.to_string()))
            .cloned())
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), MetadataError> {
        self.entries
            .lock()
            .insert((path.to_path_buf(), key.to_string()), value.to_string());
        Ok(())
    }
}

impl<S: MetadataStore + ?Sized> MetadataStore for Box<S> {
    fn get(&self, path: &Path, key: &str) -> Result<Option<String>, MetadataError> {
        (**self).get(path, key)
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), MetadataError> {
        (**self).set(path, key, value)
    }
}

impl<S: MetadataStore + ?Sized> MetadataStore for std::sync::Arc<S> {
    fn get(&self, path: &Path, key: &str) -> Result<Option<String>, MetadataError> {
        (**self).get(path, key)
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), MetadataError> {
        (**self).set(path, key, value)
    }
}
