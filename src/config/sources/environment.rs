//! Environment source: THUMBCACHE__SECTION__KEY=value
//!
//! List-valued keys take comma-separated values, e.g.
//! `THUMBCACHE__CACHE__RESOLUTIONS=16,64,256`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};
use serde::{Deserialize, Deserializer};

/// Prefix shared by all configuration variables
pub const ENV_PREFIX: &str = "THUMBCACHE";

const LIST_KEYS: [&str; 2] = ["cache.resolutions", "walk.extensions"];

/// Add the environment source to builder.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    let environment = LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    );
    builder.add_source(environment)
}

/// Deserialize a list that may arrive as a single scalar
///
/// `try_parsing` turns `THUMBCACHE__CACHE__RESOLUTIONS=2048` into an integer
/// before the list split applies, so list fields accept either shape.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
