//! Core value types: content fingerprints and thumbnail resolutions.

use crate::error::ThumbError;
use std::fmt;
use std::str::FromStr;

/// Length of a fingerprint digest in bytes (128 bits)
pub const FINGERPRINT_LEN: usize = 16;

/// Content fingerprint of a source file
///
/// Rendered as 32 lowercase hex characters. Two files with identical bytes
/// always share a fingerprint, which makes it usable as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, used for cache file names and metadata
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when a string is not a 32-character hex digest
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid fingerprint: {0:?}")]
pub struct InvalidFingerprint(pub String);

impl FromStr for Fingerprint {
    type Err = InvalidFingerprint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != FINGERPRINT_LEN * 2 {
            return Err(InvalidFingerprint(s.to_string()));
        }
        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(trimmed, &mut bytes).map_err(|_| InvalidFingerprint(s.to_string()))?;
        Ok(Self(bytes))
    }
}

/// Target longest-edge size of a thumbnail, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(u32);

impl Resolution {
    /// Returns `None` for a zero size
    pub fn new(pixels: u32) -> Option<Self> {
        (pixels > 0).then_some(Self(pixels))
    }

    pub fn pixels(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default resolutions generated for every source image
pub const DEFAULT_RESOLUTIONS: [u32; 8] = [16, 32, 64, 128, 256, 512, 1024, 2048];

/// Ordered, deduplicated set of resolutions, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionSet(Vec<Resolution>);

impl ResolutionSet {
    pub fn new(pixels: &[u32]) -> Result<Self, ThumbError> {
        if pixels.is_empty() {
            return Err(ThumbError::Configuration(
                "At least one thumbnail resolution is required".to_string(),
            ));
        }

        let mut resolutions = pixels
            .iter()
            .map(|&p| {
                Resolution::new(p).ok_or_else(|| {
                    ThumbError::Configuration("Thumbnail resolution must be non-zero".to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        resolutions.sort();
        resolutions.dedup();

        Ok(Self(resolutions))
    }

    /// Resolutions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Resolution> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ResolutionSet {
    fn default() -> Self {
        Self(
            DEFAULT_RESOLUTIONS
                .iter()
                .map(|&p| Resolution(p))
                .collect(),
        )
    }
}
