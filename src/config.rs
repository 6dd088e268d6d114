use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::constants;
use crate::error::ConfigError;
use crate::services::price_feed::{FeedSettings, ReconnectPolicy};

pub const CONFIG_PATH_ENV: &str = "SIGNAL_SENTINEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub tick_interval_ms: u64,
    /// Start monitoring as soon as the process boots
    pub autostart: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: constants::monitor::TICK_INTERVAL.as_millis() as u64,
            autostart: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    /// None retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: constants::feed::RECONNECT_DELAY.as_millis() as u64,
            backoff_multiplier: 1.0,
            max_delay_ms: constants::feed::MAX_RECONNECT_DELAY.as_millis() as u64,
            max_attempts: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub provider: String, // "binance"
    pub ws_base_url: String,
    pub rest_base_url: String,
    pub snapshot_timeout_ms: u64,
    /// Close subscriptions whose symbol no longer has a live signal
    pub close_unused: bool,
    pub reconnect: ReconnectConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            provider: "binance".to_string(),
            ws_base_url: constants::feed::BINANCE_WS_BASE_URL.to_string(),
            rest_base_url: constants::feed::BINANCE_REST_BASE_URL.to_string(),
            snapshot_timeout_ms: constants::feed::SNAPSHOT_TIMEOUT.as_millis() as u64,
            close_unused: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// None keeps signals in memory only
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(constants::storage::DEFAULT_PATH)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub history_limit: usize,
    pub bus_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            history_limit: constants::notifications::HISTORY_LIMIT,
            bus_capacity: constants::notifications::BUS_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: constants::server::DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub feed: FeedConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from `$SIGNAL_SENTINEL_CONFIG` or `config.yaml`. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("ℹ️ {} not found - using built-in defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.tick_interval_ms == 0 {
            return Err("monitor.tick_interval_ms must be greater than zero".into());
        }
        let reconnect = &self.feed.reconnect;
        if reconnect.delay_ms == 0 {
            return Err("feed.reconnect.delay_ms must be greater than zero".into());
        }
        if !reconnect.backoff_multiplier.is_finite() || reconnect.backoff_multiplier < 1.0 {
            return Err(format!(
                "feed.reconnect.backoff_multiplier must be >= 1.0 (got {})",
                reconnect.backoff_multiplier
            )
            .into());
        }
        if reconnect.max_delay_ms < reconnect.delay_ms {
            return Err("feed.reconnect.max_delay_ms must not be below delay_ms".into());
        }
        if self.feed.snapshot_timeout_ms == 0 {
            return Err("feed.snapshot_timeout_ms must be greater than zero".into());
        }
        if self.notifications.history_limit == 0 || self.notifications.bus_capacity == 0 {
            return Err("notifications.history_limit and bus_capacity must be greater than zero".into());
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.monitor.tick_interval_ms)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.feed.snapshot_timeout_ms)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let r = &self.feed.reconnect;
        ReconnectPolicy {
            delay: Duration::from_millis(r.delay_ms),
            multiplier: r.backoff_multiplier,
            max_delay: Duration::from_millis(r.max_delay_ms),
            max_attempts: r.max_attempts,
        }
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            reconnect: self.reconnect_policy(),
            close_unused: self.feed.close_unused,
        }
    }
}
