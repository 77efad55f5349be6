//! Application configuration.
//!
//! Two layers: [`Settings`] comes from the environment (and a `.env` file)
//! and must be present before anything talks to the API; [`Config`] holds
//! remembered preferences at `~/.config/marketdesk/config.json`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_STALE_MINUTES;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "marketdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const API_URL_VAR: &str = "MARKETDESK_API_URL";
pub const SESSION_SECRET_VAR: &str = "MARKETDESK_SESSION_SECRET";
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Settings required at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub session_secret: String,
}

impl Settings {
    /// Read settings from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            bail!("{} is set but empty", API_URL_VAR);
        }

        let session_secret = lookup(SESSION_SECRET_VAR)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if session_secret.is_empty() {
            bail!("{} must be set to a non-empty value", SESSION_SECRET_VAR);
        }

        Ok(Self {
            api_url,
            session_secret,
        })
    }

    /// Use `url` instead of the environment's API URL.
    pub fn with_api_url(mut self, url: &str) -> Self {
        let url = url.trim().trim_end_matches('/');
        if !url.is_empty() {
            self.api_url = url.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_email: Option<String>,
    pub api_url: Option<String>,
    pub cache_stale_minutes: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn stale_minutes(&self) -> i64 {
        self.cache_stale_minutes.unwrap_or(DEFAULT_STALE_MINUTES)
    }
}
