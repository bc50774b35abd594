//! Framework configuration, stored as RON.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::DEFAULT_SETTINGS_FILE;

/// How the plugin sets itself up.
///
/// ```ron
/// (
///     settings_file: "config/settings.cfg",
///     log_creation: false,
/// )
/// ```
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Backing file for setting values.
    pub settings_file: PathBuf,
    /// Log every setting and command as it is registered.
    pub log_creation: bool,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from(DEFAULT_SETTINGS_FILE),
            log_creation: true,
        }
    }
}

impl FrameworkConfig {
    /// Load from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;

        ron::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    /// Save to a RON file, creating parent directories if needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::Io(parent.display().to_string(), e.to_string()))?;
            }
        }

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);

        let contents = ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))
    }

    /// Load from a RON file, falling back to defaults.
    ///
    /// A missing file is silent; a broken one is logged.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(..)) if !path.exists() => Self::default(),
            Err(e) => {
                warn!("Using default framework config: {}", e);
                Self::default()
            }
        }
    }
}

/// Errors from loading or saving [`FrameworkConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error for '{0}': {1}")]
    Io(String, String),

    #[error("parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("serialize error: {0}")]
    Serialize(String),
}
