//! Configuration settings for tithe-sync.
//!
//! Settings are loaded from `config.yaml` under the data root.

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::error::TitheError;
use crate::features::sync::{validate_tag, DEFAULT_SYNC_TAG};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Offline queue settings.
    pub sync: SyncConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    /// Color output setting.
    #[serde(default = "default_color")]
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorSetting {
    /// Apply this setting to the global `colored` override.
    pub fn apply(self) {
        match self {
            Self::Auto => colored::control::unset_override(),
            Self::Always => colored::control::set_override(true),
            Self::Never => colored::control::set_override(false),
        }
    }
}

/// Offline queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Request a background sync whenever an action is queued.
    #[serde(default = "default_true")]
    pub background_sync: bool,
    /// Tag used for background sync registrations.
    #[serde(default = "default_sync_tag")]
    pub tag: String,
    /// Maximum number of actions handed to a single flush.
    #[serde(default)]
    pub flush_limit: Option<usize>,
}

const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

const fn default_color() -> ColorSetting {
    ColorSetting::Auto
}

const fn default_true() -> bool {
    true
}

fn default_sync_tag() -> String {
    DEFAULT_SYNC_TAG.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
            color: default_color(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            background_sync: default_true(),
            tag: default_sync_tag(),
            flush_limit: None,
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file exists but cannot be parsed, or if
    /// `sync.tag` cannot name a marker file.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, TitheError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            TitheError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            TitheError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })?;

        validate_tag(&config.sync.tag).map_err(|_| {
            TitheError::Config(format!(
                "Invalid sync.tag {:?} in {}: use letters, digits, '.', '_' or '-'",
                config.sync.tag,
                path.display()
            ))
        })?;

        Ok(config)
    }
}
