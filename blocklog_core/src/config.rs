//! Logger configuration.
//!
//! Configuration can be built in code or loaded from
//! `$XDG_CONFIG_HOME/blocklog/config.toml`.

use crate::{level, Error, Result, Severity};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options fixed at logger construction.
///
/// `level` is the initial threshold; it is the only setting a logger can
/// change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: Severity,

    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_true")]
    pub show_time: bool,

    #[serde(default)]
    pub short_time: bool,

    #[serde(default = "default_true")]
    pub show_channel: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::default(),
            prefix: String::new(),
            show_time: true,
            short_time: false,
            show_channel: true,
            colored: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl LoggerConfig {
    /// Default configuration with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Set the threshold from a caller-supplied level name
    pub fn level_name(mut self, name: &str) -> Result<Self> {
        self.level = level::validate(name)?;
        Ok(self)
    }

    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: LoggerConfig = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => {
                let home = std::env::var("HOME").map_err(|_| {
                    Error::Config("HOME environment variable not set".into())
                })?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(base.join("blocklog").join("config.toml"))
    }

    /// Save the configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
