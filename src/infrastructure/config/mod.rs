//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::PluginError;

/// Host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub host: HostConfig,
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostConfig {
    /// Display name of the host
    pub name: String,
    /// API version handed to plugin `init`
    pub api_version: String,
    /// API status handed to plugin `init`, e.g. "development"
    pub api_status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginsConfig {
    /// Directory scanned for dynamic plugins
    pub directory: PathBuf,
    /// Whether to load the directory at startup
    pub auto_load: bool,
    /// How often the host loop ticks the timer scheduler, in seconds
    pub tick_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: HostConfig {
                name: "prattle".to_string(),
                api_version: env!("CARGO_PKG_VERSION").to_string(),
                api_status: "development".to_string(),
            },
            plugins: PluginsConfig {
                directory: PathBuf::from("./plugins"),
                auto_load: true,
                tick_seconds: 1,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PluginError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| PluginError::Load(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| PluginError::Load(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(dir) = std::env::var("PRATTLE_PLUGINS_DIR") {
            config.plugins.directory = PathBuf::from(dir);
        }

        if let Ok(status) = std::env::var("PRATTLE_API_STATUS") {
            config.host.api_status = status;
        }

        config
    }
}
