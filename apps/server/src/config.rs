//! Application configuration.

use p2p_alerts::DisplaySettings;
use p2p_core::Market;
use p2p_feeds::{BybitConfig, BybitP2pClient, CachePolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("TELEGRAM_TOKEN is not set")]
    MissingToken,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Market to quote.
    pub market: Market,
    /// Upstream endpoint settings.
    pub upstream: UpstreamSettings,
    /// Quote cache settings.
    pub cache: CacheSettings,
    /// Seconds between alert checks.
    pub poll_interval_secs: u64,
    /// Offers shown by the best offers view.
    pub top_offers: usize,
    /// Timezone for displayed timestamps, in whole hours east of UTC.
    pub display_utc_offset_hours: i32,
    /// Keep-alive HTTP port; `None` disables the server.
    pub keep_alive_port: Option<u16>,
    /// Logging level.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market: Market::default(),
            upstream: UpstreamSettings::default(),
            cache: CacheSettings::default(),
            poll_interval_secs: 60,
            top_offers: 5,
            display_utc_offset_hours: 5,
            keep_alive_port: Some(8080),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings::with_offset_hours(
            self.market.clone(),
            self.top_offers,
            self.display_utc_offset_hours,
        )
    }
}

/// Upstream endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// P2P listing URL.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            endpoint: BybitP2pClient::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 10,
        }
    }
}

impl From<&UpstreamSettings> for BybitConfig {
    fn from(settings: &UpstreamSettings) -> Self {
        BybitConfig {
            endpoint: settings.endpoint.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            ..Default::default()
        }
    }
}

/// Quote cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Seconds a quote may be served from cache. `null` keeps it forever, `0` disables caching.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: Some(30) }
    }
}

impl From<&CacheSettings> for CachePolicy {
    fn from(settings: &CacheSettings) -> Self {
        CachePolicy::from_ttl_secs(settings.ttl_secs)
    }
}

/// Read the bot token from the environment.
pub fn bot_token_from_env() -> Result<String, ConfigError> {
    match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ConfigError::MissingToken),
    }
}
