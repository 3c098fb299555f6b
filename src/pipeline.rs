//! Walk → resolve → materialize, one file at a time
//!
//! Every per-file and per-subtree failure is logged and counted, never
//! propagated: a run always attempts every input. With `workers > 1` files are
//! processed on a bounded rayon pool; each file's work is independent and cache
//! writes are atomic renames, so no further coordination is needed.

use crate::cache::ThumbnailCache;
use crate::config::ThumbConfig;
use crate::error::ThumbError;
use crate::fingerprint::{FingerprintOrigin, FingerprintResolver};
use crate::metadata::MetadataStore;
use crate::thumbnail::{MaterializeReport, ThumbnailMaterializer};
use crate::walker::{Walker, WalkerConfig};
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Result of processing a single candidate file
#[derive(Debug)]
pub enum FileOutcome {
    Processed {
        origin: FingerprintOrigin,
        report: MaterializeReport,
    },
    Failed(ThumbError),
}

/// Counters for a complete run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidate files handed to the resolver
    pub files: usize,
    pub fingerprints_computed: usize,
    pub fingerprints_cached: usize,
    /// Cache entries written
    pub generated: usize,
    /// Resolutions whose entry already existed
    pub cached: usize,
    /// Resolutions skipped to avoid upscaling
    pub too_small: usize,
    pub read_errors: usize,
    pub decode_errors: usize,
    pub write_errors: usize,
    pub enumeration_errors: usize,
}

impl RunSummary {
    /// Fold one file's outcome into the summary
    pub fn record(mut self, outcome: &FileOutcome) -> Self {
        self.files += 1;
        match outcome {
            FileOutcome::Processed { origin, report } => {
                match origin {
                    FingerprintOrigin::Computed => self.fingerprints_computed += 1,
                    FingerprintOrigin::Cached => self.fingerprints_cached += 1,
                }
                self.generated += report.generated.len();
                self.cached += report.cached;
                self.too_small += report.too_small;
            }
            FileOutcome::Failed(err) => match err {
                ThumbError::Read { .. } => self.read_errors += 1,
                ThumbError::Decode { .. } => self.decode_errors += 1,
                ThumbError::Encode { .. } | ThumbError::CacheWrite { .. } => {
                    self.write_errors += 1
                }
                ThumbError::DirectoryEnumeration { .. } => self.enumeration_errors += 1,
                ThumbError::Configuration(_) => {}
            },
        }
        self
    }

    /// Combine two partial summaries
    pub fn merge(self, other: Self) -> Self {
        Self {
            files: self.files + other.files,
            fingerprints_computed: self.fingerprints_computed + other.fingerprints_computed,
            fingerprints_cached: self.fingerprints_cached + other.fingerprints_cached,
            generated: self.generated + other.generated,
            cached: self.cached + other.cached,
            too_small: self.too_small + other.too_small,
            read_errors: self.read_errors + other.read_errors,
            decode_errors: self.decode_errors + other.decode_errors,
            write_errors: self.write_errors + other.write_errors,
            enumeration_errors: self.enumeration_errors + other.enumeration_errors,
        }
    }

    /// Files that could not be processed
    pub fn failed_files(&self) -> usize {
        self.read_errors + self.decode_errors + self.write_errors
    }
}

/// The thumbnail cache builder
pub struct Pipeline {
    walker_config: WalkerConfig,
    resolver: FingerprintResolver,
    materializer: ThumbnailMaterializer,
    workers: usize,
}

impl Pipeline {
    /// Build from configuration, resolving the cache root and metadata backend
    pub fn from_config(config: &ThumbConfig) -> Result<Self, ThumbError> {
        let cache_root = config.cache.resolve_root()?;
        let store = config.cache.metadata.build();
        Self::new(config, cache_root, store)
    }

    /// Build with an explicit cache root and metadata store
    pub fn new(
        config: &ThumbConfig,
        cache_root: PathBuf,
        store: Box<dyn MetadataStore>,
    ) -> Result<Self, ThumbError> {
        config.ensure_valid()?;

        let cache = ThumbnailCache::new(cache_root, config.cache.layout);
        let materializer = ThumbnailMaterializer::new(
            cache,
            config.cache.resolution_set()?,
            config.cache.quality,
            config.cache.filter,
        );

        Ok(Self {
            walker_config: config.walk.clone(),
            resolver: FingerprintResolver::new(store, config.cache.filter.label()),
            materializer,
            workers: config.workers,
        })
    }

    pub fn cache(&self) -> &ThumbnailCache {
        self.materializer.cache()
    }

    /// Resolve and materialize one file, logging any failure
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let result = self.resolver.resolve_detailed(path).and_then(|resolved| {
            self.materializer
                .materialize(path, &resolved.fingerprint)
                .map(|report| (resolved.origin, report))
        });

        match result {
            Ok((origin, report)) => {
                debug!(
                    path = %path.display(),
                    generated = report.generated.len(),
                    cached = report.cached,
                    too_small = report.too_small,
                    "Processed file"
                );
                FileOutcome::Processed { origin, report }
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Skipping file");
                FileOutcome::Failed(err)
            }
        }
    }

    /// Process every candidate under `roots`
    pub fn run<I, P>(&self, roots: I) -> RunSummary
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut walker = Walker::new(roots, self.walker_config.clone());
        info!(
            cache_root = %self.cache().root().display(),
            workers = self.workers,
            "Building thumbnail cache"
        );

        let summary = if self.workers > 1 {
            self.run_parallel(&mut walker)
        } else {
            self.run_sequential(&mut walker)
        };

        RunSummary {
            enumeration_errors: summary.enumeration_errors + walker.enumeration_errors(),
            ..summary
        }
    }

    fn run_sequential(&self, walker: &mut Walker) -> RunSummary {
        walker.fold(RunSummary::default(), |summary, path| {
            summary.record(&self.process_file(&path))
        })
    }

    fn run_parallel(&self, walker: &mut Walker) -> RunSummary {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Failed to start worker pool; processing sequentially");
                return self.run_sequential(walker);
            }
        };

        pool.install(|| {
            walker
                .par_bridge()
                .map(|path| self.process_file(&path))
                .fold(RunSummary::default, |summary, outcome| summary.record(&outcome))
                .reduce(RunSummary::default, RunSummary::merge)
        })
    }
}
