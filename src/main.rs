use std::sync::Arc;

use signal_sentinel::api::{run_server, AppState};
use signal_sentinel::bus::EventBus;
use signal_sentinel::config::AppConfig;
use signal_sentinel::data::{JsonFileRepository, MemoryRepository, SignalRepository, SignalStore};
use signal_sentinel::engine::Engine;
use signal_sentinel::exchange::factory::build_feed;
use signal_sentinel::services::{MonitoringLoop, NotificationCenter, PriceFeedManager};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Setup Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Signal Sentinel...");

    // Load Configuration
    let config = AppConfig::load()?;
    info!("Loaded Configuration: {:?}", config);

    // Signal storage
    let repository: Box<dyn SignalRepository> = match &config.storage.path {
        Some(path) => {
            info!("💾 Signals stored at {}", path.display());
            Box::new(JsonFileRepository::new(path.clone()))
        }
        None => {
            warn!("⚠️ storage.path is null - signals will not survive a restart");
            Box::new(MemoryRepository::new())
        }
    };
    let store = SignalStore::open(repository);

    // Market data
    let (stream, snapshot) = build_feed(&config)?;
    info!("📡 Using {} market data feed", stream.name());
    let (feed, feed_events) = PriceFeedManager::new(stream, snapshot, config.feed_settings());
    let snapshot = feed.snapshot_fetcher();

    // Notifications
    let bus = EventBus::new(config.notifications.bus_capacity);
    let notifications = NotificationCenter::new(config.notifications.history_limit);
    notifications.start(&bus);

    // Monitoring loop
    let engine = Engine::new(store, feed, Arc::new(bus.clone()));
    let (engine_handle, monitor_task) =
        MonitoringLoop::spawn(engine, feed_events, snapshot, config.tick_interval());

    if config.monitor.autostart {
        engine_handle.start_monitoring().await?;
    }

    // Create App State
    let app_state = Arc::new(AppState {
        engine: engine_handle.clone(),
        notifications,
        bus,
        config,
    });

    // Start API Server
    info!("Initializing API Server...");
    run_server(app_state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for ctrl-c: {}", e);
        }
        info!("Shutdown requested");
    })
    .await?;

    engine_handle.shutdown().await;
    monitor_task.await?;
    info!("Signal Sentinel stopped");

    Ok(())
}
