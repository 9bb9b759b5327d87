//! Configuration management for Smartgrep
//!
//! Loads the TOML config file, applies `SMARTGREP_*` environment overrides and validates the
//! result before anything else reads it.

use crate::error::{Result, SmartgrepError};
use crate::types::{SearchModelId, UnknownModel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

/// Schema version written by this build
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
}

/// Where the indexing backend lives and how long to wait for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Duration string such as "30s", "500ms" or "2m"
    pub request_timeout: String,
}

/// Search defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub default_model: SearchModelId,
}

/// Result card presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Code lines shown per result card; 0 shows everything
    pub max_code_lines: usize,
    pub highlight_marker: String,
    pub show_line_numbers: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_code_lines: 40,
            highlight_marker: ">".to_string(),
            show_line_numbers: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SmartgrepError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SmartgrepError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load from `path` (or the default location), falling back to defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if path.exists() {
            return Self::load(&path);
        }

        tracing::debug!("Config file {:?} not found, using defaults", path);
        let mut config = Self::default();
        config.apply_env_overrides();
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SmartgrepError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SmartgrepError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: SMARTGREP_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix("SMARTGREP_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "GATEWAY__BASE_URL" => {
                self.gateway.base_url = value.to_string();
            }
            "GATEWAY__REQUEST_TIMEOUT" => {
                self.gateway.request_timeout = value.to_string();
            }
            "SEARCH__DEFAULT_MODEL" => {
                self.search.default_model =
                    value.parse().map_err(|e: UnknownModel| SmartgrepError::InvalidConfigValue {
                        path: path.to_string(),
                        message: e.to_string(),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Option<Duration> {
        parse_duration(&self.gateway.request_timeout)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            SmartgrepError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("smartgrep").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
            },
            gateway: GatewayConfig {
                base_url: "http://127.0.0.1:8000".to_string(),
                request_timeout: "30s".to_string(),
            },
            search: SearchConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Parse duration strings like "500ms", "30s", "2m", "1h" or bare seconds
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => s.split_at(split),
        None => (s, "s"),
    };
    let amount: u64 = digits.parse().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(amount)),
        "s" => Some(Duration::from_secs(amount)),
        "m" => Some(Duration::from_secs(amount.checked_mul(60)?)),
        "h" => Some(Duration::from_secs(amount.checked_mul(3600)?)),
        _ => None,
    }
}
