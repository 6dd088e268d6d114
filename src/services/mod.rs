pub mod monitor;
pub mod notifications;
pub mod price_feed;

pub use monitor::{EngineHandle, MonitoringLoop};
pub use notifications::NotificationCenter;
pub use price_feed::{FeedEvent, FeedSettings, PriceFeedManager, ReconnectPolicy, SnapshotFetcher};
