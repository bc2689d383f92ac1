//! Run configuration loaded from TOML.
//!
//! ```toml
//! [run]
//! input = "data/signals.csv"
//! output_dir = "results"
//! parallel = true
//! instruments = ["TCS", "INFY"]
//!
//! [scoring]
//! recovery_sentinel = 100.0
//!
//! [scoring.weights]
//! profit_factor = 0.25
//! ```
//!
//! Every key is optional. A missing `[scoring]` table means the default
//! profile; a partial one overrides only the keys it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::{ScoringError, ScoringProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid scoring profile: {0}")]
    Scoring(#[from] ScoringError),
}

/// Input/output settings for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Bar CSV to load. The CLI's `--input` takes precedence.
    pub input: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub parallel: bool,
    /// Allow-list of instruments; `None` runs everything in the input.
    pub instruments: Option<Vec<String>>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            input: None,
            output_dir: PathBuf::from("results"),
            parallel: true,
            instruments: None,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run: RunSection,
    pub scoring: ScoringProfile,
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(text)?;
        config.scoring.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
