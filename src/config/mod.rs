//! Configuration management
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. `<config dir>/config.{toml,json,yaml}` (optional)
//! 3. `GOVEE_*` environment variables, `__` separating nested keys
//!    (`GOVEE_API_KEY`, `GOVEE_LAN__ENABLED`, `GOVEE_CLOUD__BASE_URL`, ...)
//! 4. `GOVEE_PORT`, then the legacy `PORT`

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::cloud::DEFAULT_BASE_URL;
use crate::lan::{DiscoveryOptions, LanController};

const ENV_PREFIX: &str = "GOVEE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Govee cloud API key; only required when LAN control is disabled
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub lan: LanConfig,

    #[serde(default)]
    pub cloud: CloudConfig,
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,
    #[serde(default = "default_status_timeout_ms")]
    pub status_timeout_ms: u64,
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            discovery_timeout_ms: default_discovery_timeout_ms(),
            status_timeout_ms: default_status_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_discovery_timeout_ms() -> u64 {
    2000
}

fn default_status_timeout_ms() -> u64 {
    2000
}

impl LanConfig {
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::default().with_timeout(Duration::from_millis(self.discovery_timeout_ms))
    }

    pub fn controller(&self) -> LanController {
        LanController::new().with_status_timeout(Duration::from_millis(self.status_timeout_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_cloud_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_cloud_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_cloud_timeout_secs() -> u64 {
    30
}

impl CloudConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// API key with empty strings treated as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Without LAN control every request goes to the cloud, which needs a key
    pub fn validate(&self) -> Result<()> {
        if !self.lan.enabled && self.api_key().is_none() {
            bail!(
                "Govee API key is required when LAN mode is disabled. \
                 Provide it via GOVEE_API_KEY or api_key in the config file"
            );
        }
        Ok(())
    }
}

/// Get config directory (GOVEE_CONFIG_DIR, XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GOVEE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/govee-gateway");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("govee-gateway");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/govee-gateway");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("govee-gateway");
        }
    }

    PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", default_port() as i64)?
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // Port precedence: GOVEE_PORT > PORT > config file > default
    if let Ok(port) = std::env::var("GOVEE_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    } else if let Ok(port) = std::env::var("PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    }

    let config = builder.build()?;

    Ok(config.try_deserialize()?)
}
