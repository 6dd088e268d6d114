use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::signals::types::Signal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Connected,
    ConnectionError,
    ConnectionFailed,
    TriggerHit,
    StopLossHit,
    TakeProfitHit,
}

/// Ephemeral record of something the user should see.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Set for signal transitions, absent for feed notices
    pub signal_id: Option<String>,
    pub symbol: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl NotificationEvent {
    fn new(signal_id: Option<String>, symbol: &str, kind: NotificationKind, title: &str, message: String) -> Self {
        Self {
            signal_id,
            symbol: symbol.to_string(),
            kind,
            title: title.to_string(),
            message,
            emitted_at: Utc::now(),
        }
    }

    pub fn feed_connected(symbol: &str) -> Self {
        Self::new(None, symbol, NotificationKind::Connected, "Connected",
            format!("Real-time feed active for {}", symbol))
    }

    pub fn feed_error(symbol: &str) -> Self {
        Self::new(None, symbol, NotificationKind::ConnectionError, "Connection Error",
            format!("Lost connection to {} feed. Retrying...", symbol))
    }

    pub fn feed_failed(symbol: &str) -> Self {
        Self::new(None, symbol, NotificationKind::ConnectionFailed, "Connection Failed",
            format!("Unable to connect to {}", symbol))
    }

    pub fn trigger_hit(signal: &Signal, price: f64) -> Self {
        Self::new(Some(signal.id.clone()), &signal.symbol, NotificationKind::TriggerHit, "Trigger Hit 🎯",
            format!("{} reached trigger price: ${:.2}", signal.symbol, price))
    }

    pub fn stop_loss_hit(signal: &Signal, price: f64) -> Self {
        Self::new(Some(signal.id.clone()), &signal.symbol, NotificationKind::StopLossHit, "Stop Loss Hit 🛑",
            format!("{} hit stop loss at ${:.2}", signal.symbol, price))
    }

    pub fn take_profit_hit(signal: &Signal, price: f64) -> Self {
        Self::new(Some(signal.id.clone()), &signal.symbol, NotificationKind::TakeProfitHit, "Take Profit Hit 🎉",
            format!("{} reached take profit at ${:.2}!", signal.symbol, price))
    }
}

// Global Event Enum
#[derive(Clone, Debug)]
pub enum Event {
    Notification(NotificationEvent),
    /// The read-only view should re-render from current store state
    Refresh,
}

/// Consumer of engine side effects (toasts, OS notifications, view refresh).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: NotificationEvent);
    fn refresh(&self);
}
