//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! max_description_len = 4096
//! description_policy = "open_only"
//! event_log_capacity = 1024
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GigError, Result};

/// Default maximum description length in bytes.
pub const DEFAULT_MAX_DESCRIPTION_LEN: usize = 4096;

/// Default number of events retained by the engine.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1024;

/// Upper bound accepted for `max_description_len`.
const MAX_DESCRIPTION_LEN_LIMIT: usize = 1024 * 1024;

/// When the client may change a gig's description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionPolicy {
    /// Only while the gig is open, before any freelancer is assigned.
    #[default]
    OpenOnly,
    /// In any state.
    Anytime,
}

/// Configuration for a [`GigEngine`](crate::GigEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum description length in bytes.
    pub max_description_len: usize,
    /// When descriptions may be changed.
    pub description_policy: DescriptionPolicy,
    /// Number of events kept in memory; zero disables the log.
    pub event_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
            description_policy: DescriptionPolicy::default(),
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GigError::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| GigError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.max_description_len == 0 {
            return Err(GigError::Config(
                "max_description_len must be greater than 0".to_string(),
            ));
        }

        if self.max_description_len > MAX_DESCRIPTION_LEN_LIMIT {
            return Err(GigError::Config(format!(
                "max_description_len cannot exceed {MAX_DESCRIPTION_LEN_LIMIT}"
            )));
        }

        Ok(())
    }
}
