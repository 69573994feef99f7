//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which holds the API endpoint, the origin static assets are served from,
//! and the last category used.
//!
//! Configuration is stored at `~/.config/zeladoria/config.json`.
//! `ZELADORIA_API_URL` and `ZELADORIA_ASSET_ORIGIN` override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::CategoryId;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "zeladoria";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const ENV_API_URL: &str = "ZELADORIA_API_URL";
pub const ENV_ASSET_ORIGIN: &str = "ZELADORIA_ASSET_ORIGIN";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub asset_origin: Option<String>,
    pub default_category: Option<CategoryId>,
    /// Environment overrides, never written back to the file
    #[serde(skip)]
    env_api_url: Option<String>,
    #[serde(skip)]
    env_asset_origin: Option<String>,
}

impl Config {
    /// Load the config file and apply environment overrides.
    /// An unreadable or malformed file falls back to defaults so commands
    /// that do not need it (or that rewrite it) still run.
    pub fn load_or_default() -> Self {
        let from_file = Self::config_path().and_then(|path| Self::load_from(&path));
        Self::or_default(from_file).with_env_overrides(|key| std::env::var(key).ok())
    }

    fn or_default(from_file: Result<Self>) -> Self {
        from_file.unwrap_or_else(|e| {
            warn!(error = %format!("{:#}", e), "Ignoring unusable config file, using defaults");
            Self::default()
        })
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests
    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.env_api_url = lookup(ENV_API_URL).filter(|v| !v.is_empty());
        self.env_asset_origin = lookup(ENV_ASSET_ORIGIN).filter(|v| !v.is_empty());
        self
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn api_base_url(&self) -> &str {
        self.env_api_url
            .as_deref()
            .or(self.api_base_url.as_deref())
            .unwrap_or(DEFAULT_API_URL)
    }

    /// Assets are served by the API host unless configured otherwise
    pub fn asset_origin(&self) -> &str {
        self.env_asset_origin
            .as_deref()
            .or(self.asset_origin.as_deref())
            .unwrap_or_else(|| self.api_base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url(), DEFAULT_API_URL);
        assert_eq!(config.asset_origin(), DEFAULT_API_URL);
    }

    #[test]
    fn test_asset_origin_follows_api_url() {
        let config = Config {
            api_base_url: Some("https://zeladoria.marica.rj.gov.br".to_string()),
            ..Default::default()
        };
        assert_eq!(config.asset_origin(), "https://zeladoria.marica.rj.gov.br");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config {
            api_base_url: Some("http://from-file".to_string()),
            asset_origin: Some("http://assets-from-file".to_string()),
            default_category: Some(2),
            ..Default::default()
        }
        .with_env_overrides(|key| match key {
            ENV_API_URL => Some("http://from-env".to_string()),
            ENV_ASSET_ORIGIN => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.api_base_url(), "http://from-env");
        assert_eq!(config.asset_origin(), "http://assets-from-file");
        assert_eq!(config.default_category, Some(2));

        // Overrides are not persisted
        let saved: Config = serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(saved.api_base_url(), "http://from-file");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
        let config = Config::or_default(Config::load_from(&path));
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = serde_json::from_str(r#"{"api_base_url": "http://x"}"#).unwrap();
        assert_eq!(config.api_base_url(), "http://x");
        assert_eq!(config.default_category, None);
    }
}
