//! Thumbnail materialization
//!
//! For one source file and its fingerprint, produce every missing cache entry:
//! decode once, then resize and JPEG-encode per resolution, smallest first.

use crate::cache::ThumbnailCache;
use crate::error::ThumbError;
use crate::types::{Fingerprint, Resolution, ResolutionSet};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageError, ImageReader, ImageResult, RgbImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default JPEG quality
pub const DEFAULT_QUALITY: u8 = 75;

/// Smooth resampling filters available for downscaling
///
/// Nearest-neighbour is deliberately absent: it aliases badly at small sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    /// Linear
    Triangle,
    /// Bicubic
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    /// Label recorded in fingerprint metadata
    pub fn label(&self) -> &'static str {
        match self {
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmull-rom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        }
    }

    fn filter_type(&self) -> FilterType {
        match self {
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Target dimensions for a `width x height` source at `resolution`
///
/// The longer edge maps to the resolution; the shorter edge is scaled by the
/// same factor and rounded to the nearest pixel (never below 1).
pub fn target_size(width: u32, height: u32, resolution: Resolution) -> (u32, u32) {
    let r = resolution.pixels() as u64;
    let scale_short = |short: u32, long: u32| -> u32 {
        let (short, long) = (short as u64, long as u64);
        (((2 * r * short + long) / (2 * long)) as u32).max(1)
    };

    if width >= height {
        (resolution.pixels(), scale_short(height, width))
    } else {
        (scale_short(width, height), resolution.pixels())
    }
}

/// A cache entry written by [`ThumbnailMaterializer::materialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEntry {
    pub resolution: Resolution,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Outcome of materializing one source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Entries written by this call
    pub generated: Vec<GeneratedEntry>,
    /// Resolutions whose entry already existed
    pub cached: usize,
    /// Resolutions larger than the source's longer edge
    pub too_small: usize,
}

/// Builds cache entries for decoded source images
#[derive(Debug, Clone)]
pub struct ThumbnailMaterializer {
    cache: ThumbnailCache,
    resolutions: ResolutionSet,
    quality: u8,
    filter: ResizeFilter,
}

impl ThumbnailMaterializer {
    pub fn new(
        cache: ThumbnailCache,
        resolutions: ResolutionSet,
        quality: u8,
        filter: ResizeFilter,
    ) -> Self {
        Self {
            cache,
            resolutions,
            quality: quality.clamp(1, 100),
            filter,
        }
    }

    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Generate every missing entry for `path`
    ///
    /// Dimensions come from the image header; the pixels are decoded only if
    /// some missing entry fits the source, and at most once. A decode failure
    /// writes nothing.
    pub fn materialize(
        &self,
        path: &Path,
        fingerprint: &Fingerprint,
    ) -> Result<MaterializeReport, ThumbError> {
        let mut report = MaterializeReport::default();
        let mut dimensions: Option<(u32, u32)> = None;
        let mut source: Option<RgbImage> = None;

        for resolution in self.resolutions.iter() {
            let entry_path = self.cache.entry_path(fingerprint, resolution);
            if entry_path.is_file() {
                debug!(path = %path.display(), resolution = resolution.pixels(), "Thumbnail already cached");
                report.cached += 1;
                continue;
            }

            if dimensions.is_none() {
                dimensions = Some(read_dimensions(path)?);
            }
            let Some((width, height)) = dimensions else {
                continue;
            };
            if width.max(height) < resolution.pixels() {
                debug!(path = %path.display(), resolution = resolution.pixels(), "Source smaller than resolution");
                report.too_small += 1;
                continue;
            }

            if source.is_none() {
                source = Some(decode_source(path)?);
            }
            let Some(image) = source.as_ref() else {
                continue;
            };
            let (width, height) = image.dimensions();

            let (target_width, target_height) = target_size(width, height, resolution);
            let resized = imageops::resize(
                image,
                target_width,
                target_height,
                self.filter.filter_type(),
            );
            let bytes = encode_jpeg(&resized, self.quality).map_err(|source| ThumbError::Encode {
                path: path.to_path_buf(),
                source,
            })?;
            let written = self.cache.write_atomic(fingerprint, resolution, &bytes)?;

            info!(
                source = %path.display(),
                resolution = resolution.pixels(),
                destination = %written.display(),
                "Generated thumbnail"
            );
            report.generated.push(GeneratedEntry {
                resolution,
                path: written,
                width: target_width,
                height: target_height,
            });
        }

        Ok(report)
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, ThumbError> {
    let read_error = |source| ThumbError::Read {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(read_error)?
        .with_guessed_format()
        .map_err(read_error)
}

fn decode_error(path: &Path) -> impl FnOnce(ImageError) -> ThumbError + '_ {
    move |source| ThumbError::Decode {
        path: path.to_path_buf(),
        source,
    }
}

/// Width and height from the header alone
fn read_dimensions(path: &Path) -> Result<(u32, u32), ThumbError> {
    open_reader(path)?
        .into_dimensions()
        .map_err(decode_error(path))
}

fn decode_source(path: &Path) -> Result<RgbImage, ThumbError> {
    let image = open_reader(path)?
        .decode()
        .map_err(decode_error(path))?;

    // JPEG has no alpha channel
    Ok(image.into_rgb8())
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(image)?;
    Ok(bytes)
}
