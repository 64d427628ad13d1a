//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/alertmate/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/alertmate/` (~/.config/alertmate/)
//! - Data: `$XDG_DATA_HOME/alertmate/` (~/.local/share/alertmate/)
//! - State/Logs: `$XDG_STATE_HOME/alertmate/` (~/.local/state/alertmate/)
//!
//! The ingestion endpoint is deliberately *not* part of this file. It is a
//! runtime setting owned by [`crate::settings::SettingsStore`].

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identifier this process reports for notifications it posts itself.
pub const DEFAULT_SELF_SOURCE_ID: &str = "com.example.alertmate";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Capture configuration
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Device identity overrides
    #[serde(default)]
    pub device: DeviceConfig,

    /// Forwarder transport configuration
    #[serde(default)]
    pub forwarder: ForwarderConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Capture configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    /// Source identifier of this process. Notifications carrying it are
    /// treated as self-originated noise and dropped.
    #[serde(default = "default_self_source_id")]
    pub self_source_id: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            self_source_id: default_self_source_id(),
        }
    }
}

fn default_self_source_id() -> String {
    DEFAULT_SELF_SOURCE_ID.to_string()
}

/// Device identity configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DeviceConfig {
    /// Fixed device identifier. When unset a generated identifier is
    /// persisted under the data directory and reused.
    pub id: Option<String>,
}

/// Forwarder transport configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ForwarderConfig {
    /// HTTP request timeout in seconds. Unset leaves the transport defaults.
    pub timeout_secs: Option<u64>,
}

impl ForwarderConfig {
    /// Returns the configured request timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == Some(0) {
            return Err(Error::Config(
                "forwarder.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.capture.self_source_id.trim().is_empty() {
            return Err(Error::Config(
                "capture.self_source_id must not be empty".to_string(),
            ));
        }
        if let Some(id) = &self.device.id {
            if id.trim().is_empty() {
                return Err(Error::Config("device.id must not be empty".to_string()));
            }
        }
        self.forwarder.validate()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/alertmate/config.toml` (~/.config/alertmate/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("alertmate").join("config.toml")
    }

    /// Returns the data directory path (settings and device identity)
    ///
    /// `$XDG_DATA_HOME/alertmate/` (~/.local/share/alertmate/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("alertmate")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/alertmate/` (~/.local/state/alertmate/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("alertmate")
    }

    /// Returns the persisted runtime settings path
    ///
    /// `$XDG_DATA_HOME/alertmate/settings.toml`
    pub fn settings_path() -> PathBuf {
        Self::data_dir().join("settings.toml")
    }

    /// Returns the persisted device identifier path
    ///
    /// `$XDG_DATA_HOME/alertmate/device_id`
    pub fn device_id_path() -> PathBuf {
        Self::data_dir().join("device_id")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
