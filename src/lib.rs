//! Signal Sentinel - crypto trading signal monitoring
//!
//! This library tracks user-defined price alerts ("signals") against live
//! exchange prices and walks each one through its trigger / stop-loss /
//! take-profit lifecycle, raising notifications on every transition.

pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod engine;
pub mod error;
pub mod events;
pub mod exchange;
pub mod services;
pub mod signals;

// Re-export commonly used types
pub use bus::EventBus;
pub use config::AppConfig;
pub use engine::Engine;
pub use events::{Event, NotificationEvent, NotificationKind, NotificationSink};
pub use services::{EngineHandle, MonitoringLoop, NotificationCenter, PriceFeedManager};
pub use signals::{Direction, Signal, SignalDraft, SignalStatus};

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod events_tests;
