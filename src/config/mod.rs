//! Configuration system for modeswitch.
//!
//! This module provides the configuration structure for modeswitch with sensible
//! defaults and support for serialization/deserialization via serde. Configuration
//! is loaded from a TOML file and can be overridden by command-line arguments.
//!
//! # Example
//!
//! ```
//! use modeswitch::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.default_mode, None);
//! assert_eq!(config.line_length_limit, 80);
//!
//! // Create custom configuration
//! let custom = Config {
//!     default_mode: Some("records".to_string()),
//!     line_length_limit: 100,
//!     ..Config::default()
//! };
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the modeswitch host.
///
/// # Fields
///
/// * `default_mode` - Mode to start with when nothing was persisted (default: none, meaning "position")
/// * `state_file` - Where the persisted state lives (default: `~/.config/modeswitch/state.json`)
/// * `line_length_limit` - Preferred maximum line length for the line-length mode (default: 80)
/// * `line_length_threshold` - Hard line length warning threshold (default: 100)
/// * `status_width` - Width of the rendered status bar (default: 80)
/// * `log_level` - Default log filter when `RUST_LOG` is unset (default: "warn")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Mode to activate when no mode was persisted
    #[serde(default)]
    pub default_mode: Option<String>,

    /// Persisted state location
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Preferred maximum line length
    #[serde(default = "default_line_length_limit")]
    pub line_length_limit: usize,

    /// Line length past which the warning turns into an error
    #[serde(default = "default_line_length_threshold")]
    pub line_length_threshold: usize,

    /// Width of the rendered status bar
    #[serde(default = "default_status_width")]
    pub status_width: u16,

    /// Default log filter
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Returns the default preferred line length.
fn default_line_length_limit() -> usize {
    80
}

/// Returns the default hard line length threshold.
fn default_line_length_threshold() -> usize {
    100
}

/// Returns the default status bar width.
fn default_status_width() -> u16 {
    80
}

/// Returns the default log filter.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_mode: None,
            state_file: None,
            line_length_limit: default_line_length_limit(),
            line_length_threshold: default_line_length_threshold(),
            status_width: default_status_width(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Returns the directory holding the config and state files.
    ///
    /// Uses `~/.config/modeswitch` on all platforms.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("modeswitch");
            path
        })
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns where the persisted state should be kept.
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state_file
            .clone()
            .or_else(|| Self::config_dir().map(|dir| dir.join("state.json")))
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from(&config_path).unwrap_or_else(|err| {
            log::warn!("{:#}, using defaults", err);
            Self::default()
        })
    }

    /// Loads configuration from `path`, failing on unreadable or invalid TOML.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
