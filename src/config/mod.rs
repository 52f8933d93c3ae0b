//! Configuration module for acrl-rs
//!
//! This module handles the publisher configuration:
//! - Default endpoints for the telemetry and command transports
//! - Host loop settings (tick rate of the simulated host)
//! - Logging settings
//! - Directory overrides used to resolve the well-known files (see [`paths`])
//!
//! The configuration is read from a TOML file. Every section and field is
//! optional, so an empty file yields the built-in defaults:
//!
//! ```toml
//! app_name = "AC_RL"
//!
//! [telemetry]
//! host = "127.0.0.1"
//! port = 9876
//!
//! [input]
//! host = "127.0.0.1"
//! port = 9877
//!
//! [host]
//! tick_rate_hz = 60
//! ```
//!
//! Runtime changes made through command messages are never written back to
//! this file; they live in [`crate::transport::TransportState`] only.

pub mod paths;

pub use paths::AppPaths;

use crate::error::{AcrlError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name reported in every telemetry record
pub const APP_NAME: &str = "AC_RL";

/// Telemetry fallback filename
pub const TELEMETRY_FILENAME: &str = "AC_RL_telemetry.json";

/// Command (input) filename
pub const INPUT_FILENAME: &str = "AC_RL_input.json";

/// Diagnostic log filename
pub const DEBUG_LOG_FILENAME: &str = "AC_RL_debug.log";

/// Default configuration filename
pub const CONFIG_FILENAME: &str = "acrl.toml";

/// Default telemetry destination host
pub const DEFAULT_TELEMETRY_HOST: &str = "127.0.0.1";

/// Default telemetry destination port
pub const DEFAULT_TELEMETRY_PORT: u16 = 9876;

/// Default command listen host
pub const DEFAULT_INPUT_HOST: &str = "127.0.0.1";

/// Default command listen port
pub const DEFAULT_INPUT_PORT: u16 = 9877;

/// Default host tick rate in Hz
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

// ==================== App Config ====================

/// Top-level publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name written to the `app` key of each snapshot
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Telemetry-out endpoint
    #[serde(default = "EndpointConfig::telemetry_defaults")]
    pub telemetry: EndpointConfig,

    /// Command-in endpoint
    #[serde(default = "EndpointConfig::input_defaults")]
    pub input: EndpointConfig,

    /// Directory overrides
    #[serde(default)]
    pub paths: PathsConfig,

    /// Host loop settings
    #[serde(default)]
    pub host: HostConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_app_name() -> String {
    APP_NAME.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            telemetry: EndpointConfig::telemetry_defaults(),
            input: EndpointConfig::input_defaults(),
            paths: PathsConfig::default(),
            host: HostConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AcrlError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            AcrlError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load configuration if the file exists
    ///
    /// Logs nothing, so it can run before a subscriber is installed.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Load configuration, returning defaults if the file is missing or invalid
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_if_present(path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::info!("Config file {:?} not found, using defaults", path);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| AcrlError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            AcrlError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

// ==================== Endpoint Config ====================

/// Startup settings for one UDP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Host name or IP address
    pub host: String,

    /// UDP port (0 = ephemeral for bound endpoints)
    pub port: u16,

    /// Whether the transport is opened at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Blocking mode of the socket
    #[serde(default)]
    pub blocking: bool,
}

fn default_true() -> bool {
    true
}

impl EndpointConfig {
    /// Defaults for the telemetry-out endpoint
    pub fn telemetry_defaults() -> Self {
        Self {
            host: DEFAULT_TELEMETRY_HOST.to_string(),
            port: DEFAULT_TELEMETRY_PORT,
            enabled: true,
            blocking: false,
        }
    }

    /// Defaults for the command-in endpoint
    pub fn input_defaults() -> Self {
        Self {
            host: DEFAULT_INPUT_HOST.to_string(),
            port: DEFAULT_INPUT_PORT,
            enabled: true,
            blocking: false,
        }
    }
}

// ==================== Paths Config ====================

/// Optional directory overrides
///
/// When unset, the documents directory comes from the platform and the
/// application directory is the directory of the running executable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Host-provided writable "documents" directory
    #[serde(default)]
    pub documents_dir: Option<PathBuf>,

    /// Application directory (fallback for files, home of the debug log)
    #[serde(default)]
    pub app_dir: Option<PathBuf>,
}

// ==================== Host Config ====================

/// Settings of the host update loop driving the publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Ticks per second
    pub tick_rate_hz: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
        }
    }
}

// ==================== Logging Config ====================

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also log to stderr
    #[serde(default = "default_true")]
    pub console: bool,

    /// Write the append-only diagnostic log file
    #[serde(default = "default_true")]
    pub file: bool,
}

fn default_log_level() -> String {
    "info,acrl_rs=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: true,
            file: true,
        }
    }
}

// ==================== Tests ====================
