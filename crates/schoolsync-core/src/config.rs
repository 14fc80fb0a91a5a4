//! Application configuration management.
//!
//! This module handles loading and saving the engine configuration: backend
//! location and token, polling and reload timings, chunk size, and the
//! session the snapshot cache belongs to.
//!
//! Configuration is stored at `~/.config/schoolsync/config.json`; a few
//! fields can be overridden from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::chunked::DEFAULT_CHUNK_SIZE;
use crate::sync::SyncOptions;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "schoolsync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_BASE_URL: &str = "SCHOOLSYNC_BASE_URL";
const ENV_TOKEN: &str = "SCHOOLSYNC_TOKEN";
const ENV_SESSION: &str = "SCHOOLSYNC_SESSION";

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

const DEFAULT_RELOAD_DELAY_MS: u64 = 1500;

const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_token: Option<String>,
    pub poll_interval_secs: u64,
    pub reload_delay_ms: u64,
    pub chunk_size: usize,
    pub request_timeout_secs: u64,
    pub session_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            reload_delay_ms: DEFAULT_RELOAD_DELAY_MS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }
}

impl Config {
    /// Load from the config file (defaults when absent), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
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

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(token) = non_empty(ENV_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(session) = non_empty(ENV_SESSION) {
            self.session_id = session;
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Root directory for session-scoped storage.
    pub fn session_root(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("sessions"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            chunk_size: self.chunk_size,
            reload_delay: self.reload_delay(),
            poll_interval: self.poll_interval(),
        }
    }
}
