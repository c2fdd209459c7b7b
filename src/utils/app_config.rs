/// Application configuration management
/// Stores user preferences in ~/.config/ccc-cli/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::constants::{
    DEFAULT_CHAIN_ENV, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PRIVATE_KEY_ENV,
    DEFAULT_SWAP_WIDGET_URL, WALLET_RPC_ENV,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON-RPC endpoint of the wallet (or of the node a local key signs against)
    pub wallet_rpc_url: Option<String>,
    /// Name of the environment variable that may hold a private key
    pub private_key_env: String,
    /// Chain selected at startup
    pub default_chain: Option<String>,
    pub swap_widget_url: String,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wallet_rpc_url: None,
            private_key_env: DEFAULT_PRIVATE_KEY_ENV.to_string(),
            default_chain: None,
            swap_widget_url: DEFAULT_SWAP_WIDGET_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Directory holding the config file and the TUI log
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not determine the user config directory")?
            .join("ccc-cli");

        fs::create_dir_all(&dir)
            .context("Failed to create config directory")?;

        Ok(dir)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Self = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Environment variables win over the file
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(WALLET_RPC_ENV).filter(|v| !v.trim().is_empty()) {
            self.wallet_rpc_url = Some(url.trim().to_string());
        }
        if let Some(chain) = lookup(DEFAULT_CHAIN_ENV).filter(|v| !v.trim().is_empty()) {
            self.default_chain = Some(chain.trim().to_string());
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Private key from the configured environment variable, if set
    pub fn private_key(&self) -> Option<String> {
        std::env::var(&self.private_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}
