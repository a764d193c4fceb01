//! Configuration for imlink
//!
//! Where the store lives, which name it is derived from, and the defaults
//! the front end applies to new links.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{parse_hex, DEFAULT_DARKNESS_FACTOR, DEFAULT_LINK_COLOR};
use crate::link::DEFAULT_TITLE_MAX_LEN;
use crate::state::Language;

/// Application name the store file name is derived from.
pub const DEFAULT_APP_NAME: &str = "utility-links";

/// Database file name for an application name.
pub fn database_file_name(app_name: &str) -> String {
    format!("{}-db.sqlite3", app_name)
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImlinkConfig {
    /// Name the database file is derived from
    pub app_name: String,
    /// Directory holding the database; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// Color picker default for new links (`#RRGGBB`)
    pub default_color: String,
    /// Lightness multiplier for swatch borders
    pub darkness_factor: f64,
    /// Interface language
    pub language: Language,
    /// Maximum title length accepted from forms
    pub title_max_len: usize,
}

impl Default for ImlinkConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            data_dir: None,
            default_color: DEFAULT_LINK_COLOR.to_string(),
            darkness_factor: DEFAULT_DARKNESS_FACTOR,
            language: Language::default(),
            title_max_len: DEFAULT_TITLE_MAX_LEN,
        }
    }
}

impl ImlinkConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/imlink/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("imlink").join("config.toml"))
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Directory holding the database.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("imlink")
        })
    }

    /// Full path of the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(database_file_name(&self.app_name))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("app_name must not be empty".to_string()));
        }
        if self.app_name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(
                "app_name must not contain path separators".to_string(),
            ));
        }
        if parse_hex(&self.default_color).is_err() {
            return Err(ConfigError::Invalid(format!(
                "default_color must be #RRGGBB, got {:?}",
                self.default_color
            )));
        }
        if !(0.0..=1.0).contains(&self.darkness_factor) {
            return Err(ConfigError::Invalid(
                "darkness_factor must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.title_max_len == 0 {
            return Err(ConfigError::Invalid(
                "title_max_len must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loading error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(String),

    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Config serialize error: {0}")]
    Serialize(String),
}
