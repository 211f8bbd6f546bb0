//! CLI configuration management

use anyhow::{Context, Result};
use echoendpoint_common::{constants, routes};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("echoendpoint")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".echoendpoint")
    }
}

/// Get the config file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.yml")
}

/// Get the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// Ensure all config directories exist
pub fn ensure_dirs() -> Result<()> {
    let config = config_dir();
    let logs = logs_dir();

    fs::create_dir_all(&config).context("Failed to create config directory")?;
    fs::create_dir_all(&logs).context("Failed to create logs directory")?;

    Ok(())
}

/// Main configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint token scoping every request, event and response setting
    #[serde(default)]
    pub token: Option<String>,

    /// Backend URL (default: http://127.0.0.1:8000)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Page size for list fetches
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

fn default_server_url() -> String {
    constants::DEFAULT_SERVER_URL.to_string()
}

fn default_page_limit() -> u32 {
    constants::DEFAULT_PAGE_LIMIT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            server_url: default_server_url(),
            page_limit: default_page_limit(),
        }
    }
}

impl Config {
    /// Load config from the default file
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file())
    }

    /// Load config from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save config to the default file
    pub fn save(&self) -> Result<()> {
        ensure_dirs()?;
        self.save_to(&config_file())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply per-invocation overrides from flags or environment
    pub fn with_overrides(mut self, server_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = server_url {
            self.server_url = url;
        }
        if token.is_some() {
            self.token = token;
        }
        self
    }

    /// Get the endpoint token or error
    pub fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No endpoint token. Run `echoendpoint new` or `echoendpoint use <TOKEN>` first.")
        })
    }

    /// Set the endpoint token
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Server URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// Public capture URL for a token
    pub fn webhook_url(&self, token: &str) -> String {
        format!("{}{}", self.base_url(), routes::webhook(token))
    }

    /// Web dashboard URL for a token
    pub fn dashboard_url(&self, token: &str) -> String {
        format!("{}{}", self.base_url(), routes::dashboard(token))
    }
}
