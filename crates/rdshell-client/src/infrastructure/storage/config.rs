//! TOML-based configuration persistence for the shell.
//!
//! Reads and writes [`ShellConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\rdshell\config.toml`
//! - Linux:    `~/.config/rdshell/config.toml`
//! - macOS:    `~/Library/Application Support/rdshell/config.toml`
//!
//! ```toml
//! [shell]
//! log_level = "info"
//! control_panel_visible = true
//!
//! [tunnel]
//! endpoint = "ws://localhost:8080/ws"
//!
//! [connection]
//! hostname = "10.0.0.5"
//! port = 3389
//! ignore-cert = true
//! dpi = 96
//! width = 1280
//! height = 800
//! image = "image/png"
//! audio = "audio/L16"
//!
//! [display]
//! settle_delay_ms = 100
//! clipboard_delay_ms = 50
//!
//! [screenshot]
//! output_dir = "."
//! file_name = "screenshot.png"
//! ```
//!
//! Every section and field is optional; missing values fall back to the
//! `default_*` helpers below, so a first run works without a file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rdshell_core::ConnectionParameters;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::session_shell::ShellSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    #[serde(default)]
    pub shell: ShellSection,
    #[serde(default)]
    pub tunnel: TunnelSection,
    /// Passed to the remote manager unmodified.
    #[serde(default)]
    pub connection: ConnectionParameters,
    #[serde(default)]
    pub display: DisplaySection,
    #[serde(default)]
    pub screenshot: ScreenshotSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub control_panel_visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TunnelSection {
    /// WebSocket endpoint of the remote-desktop gateway.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplaySection {
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_clipboard_delay_ms")]
    pub clipboard_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenshotSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_endpoint() -> String {
    "ws://localhost:8080/ws".to_string()
}
fn default_settle_delay_ms() -> u64 {
    100
}
fn default_clipboard_delay_ms() -> u64 {
    50
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_file_name() -> String {
    "screenshot.png".to_string()
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            control_panel_visible: default_true(),
        }
    }
}

impl Default for TunnelSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            clipboard_delay_ms: default_clipboard_delay_ms(),
        }
    }
}

impl Default for ScreenshotSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_name: default_file_name(),
        }
    }
}

impl ShellConfig {
    /// Runtime settings for the session shell.
    pub fn shell_settings(&self) -> ShellSettings {
        ShellSettings {
            endpoint: self.tunnel.endpoint.clone(),
            parameters: self.connection.clone(),
            settle_delay: Duration::from_millis(self.display.settle_delay_ms),
            clipboard_delay: Duration::from_millis(self.display.clipboard_delay_ms),
            control_panel_visible: self.shell.control_panel_visible,
        }
    }

    /// Where screenshots are written.
    pub fn screenshot_path(&self) -> PathBuf {
        self.screenshot.output_dir.join(&self.screenshot.file_name)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config at `path`, returning `ShellConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed or contains unknown
/// connection keys.
pub fn load_config_from(path: &Path) -> Result<ShellConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ShellConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &ShellConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("rdshell"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rdshell"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("rdshell"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
