use std::path::Path;

use anyhow::Context;
use attributes_sdk::AttributesError;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

/// Prefix of environment variables overriding the YAML configuration,
/// e.g. `ATTRIBUTES_MAX_KEY_LENGTH=64`.
pub const ENV_PREFIX: &str = "ATTRIBUTES_";

pub const DEFAULT_MAX_KEY_LENGTH: usize = 256;

/// Configuration for the attributes module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributesConfig {
    /// Longest accepted attribute key, in characters
    #[serde(default = "default_max_key_length")]
    pub max_key_length: usize,
}

fn default_max_key_length() -> usize {
    DEFAULT_MAX_KEY_LENGTH
}

impl Default for AttributesConfig {
    fn default() -> Self {
        Self {
            max_key_length: default_max_key_length(),
        }
    }
}

impl AttributesConfig {
    /// Loads the configuration from a YAML file, then applies
    /// `ATTRIBUTES_*` environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be parsed or the configuration is
    /// invalid.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX));
        Self::from_figment(&figment)
            .with_context(|| format!("failed to load attributes config from {}", path.display()))
    }

    /// # Errors
    /// Returns an error if the document is malformed or the configuration is
    /// invalid.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Self::from_figment(&Figment::new().merge(Yaml::string(yaml)))
    }

    fn from_figment(figment: &Figment) -> anyhow::Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `InvalidKey` when `max_key_length` is zero, since no key
    /// could ever be stored.
    pub fn validate(&self) -> Result<(), AttributesError> {
        if self.max_key_length == 0 {
            return Err(AttributesError::InvalidKey(
                "max_key_length must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}
