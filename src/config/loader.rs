//! Config loader: merges sources and validates the result.

use super::sources::{environment, global_file};
use super::ThumbConfig;
use crate::error::ThumbError;
use config::{Config, File};
use std::path::Path;

/// Loads [`ThumbConfig`] from files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration: defaults, global file, environment
    pub fn load() -> Result<ThumbConfig, ThumbError> {
        let builder = global_file::add_to_builder(Config::builder())?;
        let builder = environment::add_to_builder(builder);
        Self::finish(builder.build()?)
    }

    /// Load configuration from a single file on top of defaults
    pub fn load_from_file(path: &Path) -> Result<ThumbConfig, ThumbError> {
        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .build()?;
        Self::finish(config)
    }

    fn finish(config: Config) -> Result<ThumbConfig, ThumbError> {
        let config: ThumbConfig = config.try_deserialize()?;
        config.ensure_valid()?;
        Ok(config)
    }
}
