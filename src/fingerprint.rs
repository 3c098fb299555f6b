//! Content fingerprints
//!
//! A fingerprint is the first 128 bits of the BLAKE3 digest of a file's bytes.
//! Hashing a large image on every run is wasteful, so the resolver persists the
//! result as out-of-band metadata on the source file and trusts it on later runs.
//! The cached value is never checked against the live mtime or content.

use crate::error::{MetadataError, ThumbError};
use crate::metadata::{MetadataStore, FILTER_KEY, FINGERPRINT_KEY, MTIME_KEY};
use crate::types::{Fingerprint, FINGERPRINT_LEN};
use blake3::Hasher;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Compute the fingerprint of in-memory bytes
pub fn fingerprint_bytes(content: &[u8]) -> Fingerprint {
    let mut hasher = Hasher::new();
    hasher.update(content);
    finalize(&hasher)
}

/// Compute the fingerprint of a file, streaming its content through the hasher
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint, ThumbError> {
    let read_error = |source| ThumbError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    std::io::copy(&mut reader, &mut hasher).map_err(read_error)?;

    Ok(finalize(&hasher))
}

fn finalize(hasher: &Hasher) -> Fingerprint {
    let digest = hasher.finalize();
    let mut bytes = [0u8; FINGERPRINT_LEN];
    bytes.copy_from_slice(&digest.as_bytes()[..FINGERPRINT_LEN]);
    Fingerprint::from_bytes(bytes)
}

/// Where a resolved fingerprint came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintOrigin {
    /// Read back from persisted metadata
    Cached,
    /// Computed by hashing the file
    Computed,
}

/// A fingerprint together with its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFingerprint {
    pub fingerprint: Fingerprint,
    pub origin: FingerprintOrigin,
}

/// Resolves file fingerprints through a metadata cache
pub struct FingerprintResolver<S = Box<dyn MetadataStore>> {
    store: S,
    filter_label: String,
    metadata_disabled: AtomicBool,
}

impl<S: MetadataStore> FingerprintResolver<S> {
    /// `filter_label` is recorded next to every fingerprint written
    pub fn new(store: S, filter_label: impl Into<String>) -> Self {
        Self {
            store,
            filter_label: filter_label.into(),
            metadata_disabled: AtomicBool::new(false),
        }
    }

    /// Fingerprint of `path`
    pub fn resolve(&self, path: &Path) -> Result<Fingerprint, ThumbError> {
        self.resolve_detailed(path).map(|r| r.fingerprint)
    }

    /// Fingerprint of `path`, reporting whether hashing was needed
    pub fn resolve_detailed(&self, path: &Path) -> Result<ResolvedFingerprint, ThumbError> {
        if let Some(fingerprint) = self.read_cached(path) {
            debug!(path = %path.display(), %fingerprint, "Fingerprint read from metadata");
            return Ok(ResolvedFingerprint {
                fingerprint,
                origin: FingerprintOrigin::Cached,
            });
        }

        let fingerprint = fingerprint_file(path)?;
        debug!(path = %path.display(), %fingerprint, "Fingerprint computed");
        self.persist(path, &fingerprint);

        Ok(ResolvedFingerprint {
            fingerprint,
            origin: FingerprintOrigin::Computed,
        })
    }

    /// Whether metadata caching has been switched off for this run
    pub fn metadata_disabled(&self) -> bool {
        self.metadata_disabled.load(Ordering::Relaxed)
    }

    fn read_cached(&self, path: &Path) -> Option<Fingerprint> {
        if self.metadata_disabled() {
            return None;
        }

        match self.store.get(path, FINGERPRINT_KEY) {
            Ok(Some(value)) => match value.parse::<Fingerprint>() {
                Ok(fingerprint) => Some(fingerprint),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Ignoring malformed cached fingerprint");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.handle_store_error(path, e, StoreOp::Read);
                None
            }
        }
    }

    fn persist(&self, path: &Path, fingerprint: &Fingerprint) {
        if self.metadata_disabled() {
            return;
        }

        let mtime = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified).timestamp().to_string(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Source mtime unavailable");
                "0".to_string()
            }
        };

        let fields = [
            (FINGERPRINT_KEY, fingerprint.to_hex()),
            (MTIME_KEY, mtime),
            (FILTER_KEY, self.filter_label.clone()),
        ];
        for (key, value) in fields.iter() {
            if let Err(e) = self.store.set(path, key, value) {
                self.handle_store_error(path, e, StoreOp::Write);
                return;
            }
        }
    }

    fn handle_store_error(&self, path: &Path, err: MetadataError, op: StoreOp) {
        match err {
            MetadataError::Unsupported(_) => {
                if !self.metadata_disabled.swap(true, Ordering::Relaxed) {
                    warn!(
                        path = %path.display(),
                        "Filesystem does not support extended attributes; fingerprints will be recomputed"
                    );
                }
            }
            MetadataError::Io(e) => match op {
                StoreOp::Read => {
                    debug!(path = %path.display(), error = %e, "Fingerprint metadata unavailable");
                }
                // A failed write means this file is re-hashed on every run
                StoreOp::Write => {
                    warn!(path = %path.display(), error = %e, "Failed to persist fingerprint metadata");
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StoreOp {
    Read,
    Write,
}
