//! Scheduler configuration
//!
//! Nothing here changes the order the builder produces. These knobs only
//! affect what the controller exposes to presentation and how loudly it logs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Result, TurnError};

/// Configuration for a turn controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How many upcoming slots the turn-order display shows
    ///
    /// The on-map turn window draws one icon per slot. Five icons fit the
    /// default window without scrolling.
    pub preview_len: usize,

    /// Log the full rendered queue every time a new turn is built
    ///
    /// Useful when tuning unit counts; noisy on large maps.
    pub trace_queue: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            preview_len: 5,
            trace_queue: false,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.preview_len == 0 {
            return Err(TurnError::InvalidConfig(
                "preview_len must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SchedulerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }
}

/// Path of the bundled default config
pub fn default_config_path() -> PathBuf {
    PathBuf::from("data").join("turn_order.toml")
}
