//! Application-wide constants and magic numbers
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make the engine easier to tune.

use std::time::Duration;

/// Monitoring loop constants
pub mod monitor {
    use super::*;

    /// How often active/triggered signals are re-evaluated
    pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

    /// Capacity of the command channel feeding the monitoring loop
    pub const COMMAND_QUEUE_SIZE: usize = 64;
}

/// Market data feed constants
pub mod feed {
    use super::*;

    /// Delay before re-checking a dropped subscription
    pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

    /// Upper bound for the reconnect delay when backoff growth is enabled
    pub const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

    /// Timeout for one-shot price snapshot requests
    pub const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

    pub const BINANCE_WS_BASE_URL: &str = "wss://stream.binance.com:9443/ws";
    pub const BINANCE_REST_BASE_URL: &str = "https://api.binance.com";
}

/// Notification constants
pub mod notifications {
    /// Number of notifications kept for display
    pub const HISTORY_LIMIT: usize = 50;

    /// Badge counts above this are shown as "99+"
    pub const BADGE_CAP: usize = 99;

    /// Event bus capacity (notifications + refresh pings)
    pub const BUS_CAPACITY: usize = 256;
}

/// Storage constants
pub mod storage {
    pub const DEFAULT_PATH: &str = "./data/signals.json";
}

/// HTTP server constants
pub mod server {
    pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
}

/// Logging event names for structured logging
pub mod events {
    pub const SIGNAL_CREATED: &str = "signal_created";
    pub const SIGNAL_DELETED: &str = "signal_deleted";
    pub const TRIGGER_HIT: &str = "trigger_hit";
    pub const STOP_LOSS_HIT: &str = "stop_loss_hit";
    pub const TAKE_PROFIT_HIT: &str = "take_profit_hit";
    pub const FEED_CONNECTED: &str = "feed_connected";
    pub const FEED_CLOSED: &str = "feed_closed";
    pub const FEED_RECONNECT_SCHEDULED: &str = "feed_reconnect_scheduled";
    pub const TICK_DISCARDED: &str = "tick_discarded";
}
