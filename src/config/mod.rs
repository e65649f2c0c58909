//! Verifier configuration, loaded from TOML.

use std::fs;
use std::path::Path;
use std::string::{String, ToString};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Region partitioning; every address pair of a request is accounted for.
    #[default]
    Partition,
    /// Corner-packet probing through the first-match evaluator.
    FirstMatch,
}

impl std::str::FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partition" => Ok(Mode::Partition),
            "first-match" => Ok(Mode::FirstMatch),
            other => Err(ConfigError::UnknownMode(other.into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    pub mode: Mode,
    /// Print the sub-rule table after each request.
    pub trace: bool,
    /// Process exit status when at least one request fails.
    pub fail_exit_code: i32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Partition,
            trace: false,
            fail_exit_code: 1,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unknown mode `{0}`, expected partition or first-match")]
    UnknownMode(String),
}

impl VerifierConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
