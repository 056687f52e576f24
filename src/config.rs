//! Sync configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! convention = "wgsl"
//! check_value_lengths = true
//! log_layouts = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::uniform::LayoutConvention;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How layouts are built and compiled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Layout convention of the target uniform blocks
    pub convention: LayoutConvention,

    /// Array writers reject short live values before writing anything
    pub check_value_lengths: bool,

    /// Log each built layout as a table at debug level
    pub log_layouts: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            convention: LayoutConvention::Std140,
            check_value_lengths: true,
            log_layouts: false,
        }
    }
}

impl SyncConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("[SyncConfig] Loaded {} ({})", path.display(), config.convention);
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}
