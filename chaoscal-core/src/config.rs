//! Sync configuration.
//!
//! Read from `~/.config/chaoscal/config.toml`, with `CHAOSCAL_*` environment
//! variables layered on top. Every key is optional:
//!
//! ```toml
//! sync_interval = "60m"
//! proxy_url = "https://api.allorigins.win/raw"
//! request_timeout = "30s"
//! user_agent = "chaoscal/0.1.0"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_PROXY_URL, DEFAULT_SYNC_INTERVAL, DEFAULT_USER_AGENT};
use crate::error::{ChaosCalError, ChaosCalResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Period of the automatic re-sync of every subscription
    pub sync_interval: Duration,
    /// Pass-through endpoint used by subscriptions with `use_proxy`
    pub proxy_url: String,
    /// None leaves the HTTP client's default in place
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            sync_interval: DEFAULT_SYNC_INTERVAL,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            request_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// On-disk shape: durations are humantime strings.
#[derive(Deserialize, Default)]
struct RawSyncConfig {
    sync_interval: Option<String>,
    proxy_url: Option<String>,
    request_timeout: Option<String>,
    user_agent: Option<String>,
}

impl SyncConfig {
    pub fn config_path() -> ChaosCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChaosCalError::Config("Could not determine config directory".into()))?
            .join("chaoscal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> ChaosCalResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> ChaosCalResult<Self> {
        let raw: RawSyncConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("CHAOSCAL"))
            .build()
            .map_err(|e| ChaosCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ChaosCalError::Config(e.to_string()))?;

        Self::from_raw(raw)
    }

    pub fn from_toml(content: &str) -> ChaosCalResult<Self> {
        let raw: RawSyncConfig =
            toml::from_str(content).map_err(|e| ChaosCalError::Config(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSyncConfig) -> ChaosCalResult<Self> {
        let defaults = SyncConfig::default();

        let sync_interval = match raw.sync_interval {
            Some(s) => parse_duration("sync_interval", &s)?,
            None => defaults.sync_interval,
        };
        if sync_interval.is_zero() {
            return Err(ChaosCalError::Config(
                "sync_interval must be greater than zero".into(),
            ));
        }

        let proxy_url = raw.proxy_url.unwrap_or(defaults.proxy_url);
        url::Url::parse(&proxy_url)
            .map_err(|e| ChaosCalError::Config(format!("Invalid proxy_url '{proxy_url}': {e}")))?;

        let request_timeout = raw
            .request_timeout
            .map(|s| parse_duration("request_timeout", &s))
            .transpose()?;

        Ok(SyncConfig {
            sync_interval,
            proxy_url,
            request_timeout,
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
        })
    }
}

fn parse_duration(key: &str, value: &str) -> ChaosCalResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| ChaosCalError::Config(format!("Invalid {key} '{value}': {e}")))
}
