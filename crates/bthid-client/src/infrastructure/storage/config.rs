//! TOML-based configuration for the HID bridge.
//!
//! Read from `$XDG_CONFIG_HOME/bthid/config.toml` (or `~/.config/bthid/config.toml`)
//! unless `--config` names another file.  Every field is optional; a missing
//! file behaves exactly like an empty one.
//!
//! ```toml
//! [input]
//! devices = [3, 5]
//! mute_x11 = true
//!
//! [bluetooth]
//! register_sdp = true
//! service_name = "Living room keyboard"
//!
//! [session]
//! cooldown_ms = 500
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent, so older or partial files keep
//! working as new settings are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::session::SessionConfig;
use crate::infrastructure::input::MAX_EVENT_DEVICES;
use crate::infrastructure::sdp::ServiceRecord;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
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

    /// Parsed fine, but the values make no sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub bluetooth: BluetoothConfig,
    #[serde(default)]
    pub session: SessionTimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where input comes from.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InputConfig {
    /// Event device indices (`eventN`).  Empty means every device.
    #[serde(default)]
    pub devices: Vec<u8>,
    /// Read raw input records from this named pipe instead of devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fifo: Option<PathBuf>,
    /// Disable the forwarded devices in the local X session.
    #[serde(default)]
    pub mute_x11: bool,
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,
}

/// Listener PSMs and the advertised service record.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BluetoothConfig {
    #[serde(default = "default_true")]
    pub register_sdp: bool,
    #[serde(default = "default_control_psm")]
    pub control_psm: u16,
    #[serde(default = "default_interrupt_psm")]
    pub interrupt_psm: u16,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_description")]
    pub service_description: String,
    #[serde(default = "default_service_provider")]
    pub service_provider: String,
}

/// Lifecycle timings.  See [`SessionConfig`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SessionTimingConfig {
    #[serde(default = "default_control_accept_timeout_ms")]
    pub control_accept_timeout_ms: u64,
    #[serde(default = "default_interrupt_accept_timeout_ms")]
    pub interrupt_accept_timeout_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_active_poll_ms")]
    pub active_poll_ms: u64,
    #[serde(default = "default_idle_poll_us")]
    pub idle_poll_us: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_device_dir() -> PathBuf {
    PathBuf::from("/dev/input")
}
fn default_control_psm() -> u16 {
    17
}
fn default_interrupt_psm() -> u16 {
    19
}
fn default_service_name() -> String {
    "Bluetooth HID Keyboard/Mouse".to_string()
}
fn default_service_description() -> String {
    "Local input devices as a Bluetooth keyboard and mouse".to_string()
}
fn default_service_provider() -> String {
    "bthid".to_string()
}
fn default_control_accept_timeout_ms() -> u64 {
    1000
}
fn default_interrupt_accept_timeout_ms() -> u64 {
    3000
}
fn default_cooldown_ms() -> u64 {
    500
}
fn default_active_poll_ms() -> u64 {
    1000
}
fn default_idle_poll_us() -> u64 {
    500
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            fifo: None,
            mute_x11: false,
            device_dir: default_device_dir(),
        }
    }
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            register_sdp: default_true(),
            control_psm: default_control_psm(),
            interrupt_psm: default_interrupt_psm(),
            service_name: default_service_name(),
            service_description: default_service_description(),
            service_provider: default_service_provider(),
        }
    }
}

impl Default for SessionTimingConfig {
    fn default() -> Self {
        Self {
            control_accept_timeout_ms: default_control_accept_timeout_ms(),
            interrupt_accept_timeout_ms: default_interrupt_accept_timeout_ms(),
            cooldown_ms: default_cooldown_ms(),
            active_poll_ms: default_active_poll_ms(),
            idle_poll_us: default_idle_poll_us(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Derived settings ──────────────────────────────────────────────────────────

impl AppConfig {
    /// Rejects combinations that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(&bad) = self.input.devices.iter().find(|&&i| i >= MAX_EVENT_DEVICES) {
            return Err(ConfigError::Invalid(format!(
                "event device index {bad} out of range 0..{MAX_EVENT_DEVICES}"
            )));
        }
        if self.input.fifo.is_some() && !self.input.devices.is_empty() {
            return Err(ConfigError::Invalid(
                "a fifo and event devices cannot be used together".to_string(),
            ));
        }
        let bt = &self.bluetooth;
        // L2CAP PSMs are odd by definition.
        for psm in [bt.control_psm, bt.interrupt_psm] {
            if psm % 2 == 0 {
                return Err(ConfigError::Invalid(format!("psm {psm} is not odd")));
            }
        }
        if bt.control_psm == bt.interrupt_psm {
            return Err(ConfigError::Invalid(
                "control and interrupt psm must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_session_config(&self) -> SessionConfig {
        let s = &self.session;
        SessionConfig {
            control_accept_timeout: Duration::from_millis(s.control_accept_timeout_ms),
            interrupt_accept_timeout: Duration::from_millis(s.interrupt_accept_timeout_ms),
            cooldown: Duration::from_millis(s.cooldown_ms),
            active_poll: Duration::from_millis(s.active_poll_ms),
            idle_poll: Duration::from_micros(s.idle_poll_us),
        }
    }

    pub fn service_record(&self) -> ServiceRecord {
        let bt = &self.bluetooth;
        ServiceRecord {
            name: bt.service_name.clone(),
            description: bt.service_description.clone(),
            provider: bt.service_provider.clone(),
            control_psm: bt.control_psm,
            interrupt_psm: bt.interrupt_psm,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// `$XDG_CONFIG_HOME/bthid`, falling back to `~/.config/bthid`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither variable is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .map(|base| base.join("bthid"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from `path`, or from the default location when `None`.
///
/// A missing file yields `AppConfig::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match config_file_path() {
            Ok(p) => p,
            // Nowhere to look means nothing to load.
            Err(ConfigError::NoPlatformConfigDir) => return Ok(AppConfig::default()),
            Err(e) => return Err(e),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
