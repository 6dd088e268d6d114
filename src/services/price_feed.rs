//! Per-symbol market data subscriptions and the latest-price cache.
//!
//! Each connection attempt runs in its own task and reports back over an
//! unbounded channel as [`FeedEvent`]s tagged with a generation number. The
//! owner of the manager feeds those events back through
//! [`PriceFeedManager::handle_event`], so the cache and the subscription state
//! machine are only ever written from one place. Events from a generation that
//! is no longer current (closed, torn down, superseded) are ignored.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::constants::{self, events};
use crate::events::NotificationEvent;
use crate::exchange::traits::{MarketDataStream, PriceSnapshot};
use crate::exchange::types::{decode_ticker, PriceTick};

pub type FeedEventSender = mpsc::UnboundedSender<FeedEvent>;
pub type FeedEventReceiver = mpsc::UnboundedReceiver<FeedEvent>;

#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Connected { symbol: String, generation: u64 },
    Tick { generation: u64, tick: PriceTick },
    TransportError { symbol: String, generation: u64, error: String },
    ConnectFailed { symbol: String, generation: u64, error: String },
    Closed { symbol: String, generation: u64 },
    RetryDue { symbol: String, generation: u64 },
}

impl FeedEvent {
    pub fn symbol(&self) -> &str {
        match self {
            FeedEvent::Tick { tick, .. } => &tick.symbol,
            FeedEvent::Connected { symbol, .. }
            | FeedEvent::TransportError { symbol, .. }
            | FeedEvent::ConnectFailed { symbol, .. }
            | FeedEvent::Closed { symbol, .. }
            | FeedEvent::RetryDue { symbol, .. } => symbol,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            FeedEvent::Connected { generation, .. }
            | FeedEvent::Tick { generation, .. }
            | FeedEvent::TransportError { generation, .. }
            | FeedEvent::ConnectFailed { generation, .. }
            | FeedEvent::Closed { generation, .. }
            | FeedEvent::RetryDue { generation, .. } => *generation,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    Connecting,
    Open,
    /// Transport gone; a retry re-check is pending.
    Closed,
    /// Reconnect attempts exhausted. Stays put until the symbol is no longer
    /// needed or the feed is torn down, so ticks do not reopen it.
    GaveUp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: constants::feed::RECONNECT_DELAY,
            multiplier: 1.0,
            max_delay: constants::feed::MAX_RECONNECT_DELAY,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the re-check that follows `attempt` previous failures.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.multiplier <= 1.0 {
            return self.delay;
        }
        let factor = self.multiplier.powi(attempt.min(64) as i32);
        let millis = (self.delay.as_millis() as f64 * factor).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis as u64).max(self.delay)
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(false, |max| attempts >= max)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeedSettings {
    pub reconnect: ReconnectPolicy,
    /// Close subscriptions whose symbol is no longer needed
    pub close_unused: bool,
}

/// One-shot price lookups. Failures are logged and yield `None`.
#[derive(Clone)]
pub struct SnapshotFetcher {
    source: Arc<dyn PriceSnapshot>,
}

impl SnapshotFetcher {
    pub fn new(source: Arc<dyn PriceSnapshot>) -> Self {
        Self { source }
    }

    pub async fn fetch_snapshot(&self, symbol: &str) -> Option<f64> {
        match self.source.fetch_price(symbol).await {
            Ok(price) if price.is_finite() && price > 0.0 => {
                info!("📸 [FEED] Snapshot {} = {}", symbol, price);
                Some(price)
            }
            Ok(price) => {
                warn!("⚠️ [FEED] Ignoring unusable snapshot for {}: {}", symbol, price);
                None
            }
            Err(e) => {
                warn!("⚠️ [FEED] Snapshot fetch failed for {}: {}", symbol, e);
                None
            }
        }
    }
}

struct Subscription {
    state: SubscriptionState,
    generation: u64,
    /// Consecutive closes since the last successful open
    attempts: u32,
    task: Option<JoinHandle<()>>,
    retry: Option<JoinHandle<()>>,
}

impl Subscription {
    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(retry) = self.retry.take() {
            retry.abort();
        }
    }
}

pub struct PriceFeedManager {
    stream: Arc<dyn MarketDataStream>,
    snapshot: SnapshotFetcher,
    settings: FeedSettings,
    subscriptions: HashMap<String, Subscription>,
    cache: HashMap<String, PriceTick>,
    events_tx: FeedEventSender,
    next_generation: u64,
}

impl PriceFeedManager {
    pub fn new(
        stream: Arc<dyn MarketDataStream>,
        snapshot: Arc<dyn PriceSnapshot>,
        settings: FeedSettings,
    ) -> (Self, FeedEventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            stream,
            snapshot: SnapshotFetcher::new(snapshot),
            settings,
            subscriptions: HashMap::new(),
            cache: HashMap::new(),
            events_tx,
            next_generation: 1,
        };
        (manager, events_rx)
    }

    pub fn snapshot_fetcher(&self) -> SnapshotFetcher {
        self.snapshot.clone()
    }

    pub async fn fetch_snapshot(&self, symbol: &str) -> Option<f64> {
        self.snapshot.fetch_snapshot(symbol).await
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Open a subscription unless one already exists (connecting, open,
    /// waiting on a retry, or given up). Returns true when a new one was started.
    pub fn ensure_subscribed(&mut self, symbol: &str) -> bool {
        if self.subscriptions.contains_key(symbol) {
            return false;
        }
        self.open(symbol, 0);
        true
    }

    fn open(&mut self, symbol: &str, attempts: u32) {
        let generation = self.next_generation;
        self.next_generation += 1;

        info!("🔌 [FEED] Connecting {} via {} (generation {})", symbol, self.stream.name(), generation);
        let task = tokio::spawn(run_subscription(
            self.stream.clone(),
            symbol.to_string(),
            generation,
            self.events_tx.clone(),
        ));

        self.subscriptions.insert(
            symbol.to_string(),
            Subscription {
                state: SubscriptionState::Connecting,
                generation,
                attempts,
                task: Some(task),
                retry: None,
            },
        );
    }

    /// Close subscriptions outside `needed` when the close-unused policy is on.
    /// Given-up entries outside `needed` are always dropped. Returns the
    /// symbols that were removed.
    pub fn unsubscribe_unused(&mut self, needed: &BTreeSet<String>) -> Vec<String> {
        let close_unused = self.settings.close_unused;
        let unused: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|(s, sub)| {
                !needed.contains(*s) && (close_unused || sub.state == SubscriptionState::GaveUp)
            })
            .map(|(s, _)| s.clone())
            .collect();
        for symbol in &unused {
            self.close(symbol);
        }
        unused
    }

    fn close(&mut self, symbol: &str) {
        if let Some(mut sub) = self.subscriptions.remove(symbol) {
            sub.abort();
            info!("🔌 [FEED] Closed subscription for {} (no longer needed)", symbol);
        }
        self.cache.remove(symbol);
    }

    /// Drop cached prices for symbols that are neither in `needed` nor
    /// subscribed. Returns how many entries were removed.
    pub fn prune_cache(&mut self, needed: &BTreeSet<String>) -> usize {
        let before = self.cache.len();
        let subscriptions = &self.subscriptions;
        self.cache
            .retain(|symbol, _| needed.contains(symbol) || subscriptions.contains_key(symbol));
        let pruned = before - self.cache.len();
        if pruned > 0 {
            debug!("[FEED] Pruned {} stale cached price(s)", pruned);
        }
        pruned
    }

    /// Close everything, clear the cache, cancel pending retries.
    pub fn teardown(&mut self) {
        let count = self.subscriptions.len();
        for (_, mut sub) in self.subscriptions.drain() {
            sub.abort();
        }
        self.cache.clear();
        if count > 0 {
            info!("🔌 [FEED] Teardown closed {} subscription(s)", count);
        }
    }

    pub fn latest_price(&self, symbol: &str) -> Option<f64> {
        self.cache.get(symbol).map(|t| t.price)
    }

    pub fn latest_tick(&self, symbol: &str) -> Option<&PriceTick> {
        self.cache.get(symbol)
    }

    /// Seed the cache from a snapshot. A live tick already cached wins.
    pub fn seed_price(&mut self, symbol: &str, price: f64) {
        if price.is_finite() && price > 0.0 {
            self.cache
                .entry(symbol.to_string())
                .or_insert_with(|| PriceTick::now(symbol, price));
        }
    }

    pub fn subscription_state(&self, symbol: &str) -> Option<SubscriptionState> {
        self.subscriptions.get(symbol).map(|s| s.state)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn subscribed_symbols(&self) -> BTreeSet<String> {
        self.subscriptions.keys().cloned().collect()
    }

    pub fn has_pending_retry(&self, symbol: &str) -> bool {
        self.subscriptions
            .get(symbol)
            .map_or(false, |s| s.retry.is_some())
    }

    /// Apply one event from a subscription task or retry timer. `needed` is
    /// consulted when a retry comes due. Returns a user-facing notice, if any.
    pub fn handle_event(&mut self, event: FeedEvent, needed: &BTreeSet<String>) -> Option<NotificationEvent> {
        let symbol = event.symbol().to_string();
        let current = self.subscriptions.get(&symbol).map(|s| s.generation);
        if current != Some(event.generation()) {
            debug!("[FEED] Ignoring stale event for {} (generation {})", symbol, event.generation());
            return None;
        }

        match event {
            FeedEvent::Connected { .. } => {
                if let Some(sub) = self.subscriptions.get_mut(&symbol) {
                    sub.state = SubscriptionState::Open;
                    sub.attempts = 0;
                }
                info!(event = events::FEED_CONNECTED, "✅ [FEED] WebSocket connected for {}", symbol);
                Some(NotificationEvent::feed_connected(&symbol))
            }
            FeedEvent::Tick { tick, .. } => {
                debug!("[FEED] {} = {}", tick.symbol, tick.price);
                self.cache.insert(symbol, tick);
                None
            }
            FeedEvent::TransportError { error, .. } => {
                // The close that follows drives the reconnect.
                error!("❌ [FEED] WebSocket error for {}: {}", symbol, error);
                Some(NotificationEvent::feed_error(&symbol))
            }
            FeedEvent::ConnectFailed { error, .. } => {
                error!("❌ [FEED] Failed to connect {}: {}", symbol, error);
                Some(NotificationEvent::feed_failed(&symbol))
            }
            FeedEvent::Closed { .. } => {
                self.on_closed(&symbol);
                None
            }
            FeedEvent::RetryDue { .. } => {
                self.on_retry_due(&symbol, needed);
                None
            }
        }
    }

    fn on_closed(&mut self, symbol: &str) {
        let policy = self.settings.reconnect.clone();
        let Some(sub) = self.subscriptions.get_mut(symbol) else {
            return;
        };
        sub.state = SubscriptionState::Closed;
        sub.task = None;

        if policy.exhausted(sub.attempts) {
            warn!("⚠️ [FEED] Giving up on {} after {} reconnect attempt(s)", symbol, sub.attempts);
            sub.state = SubscriptionState::GaveUp;
            return;
        }

        let delay = policy.delay_for(sub.attempts);
        sub.attempts += 1;
        let generation = sub.generation;
        let tx = self.events_tx.clone();
        let owned = symbol.to_string();
        sub.retry = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(FeedEvent::RetryDue { symbol: owned, generation });
        }));

        info!(event = events::FEED_CLOSED, "⚠ [FEED] WebSocket closed for {}", symbol);
        warn!(
            event = events::FEED_RECONNECT_SCHEDULED,
            "🔄 [FEED] Re-checking {} in {:?} (attempt {})",
            symbol, delay, sub.attempts
        );
    }

    fn on_retry_due(&mut self, symbol: &str, needed: &BTreeSet<String>) {
        let Some(sub) = self.subscriptions.get_mut(symbol) else {
            return;
        };
        if sub.state != SubscriptionState::Closed {
            return;
        }
        sub.retry = None;
        let attempts = sub.attempts;

        if needed.contains(symbol) {
            info!("🔄 [FEED] Reconnecting {} (attempt {})", symbol, attempts);
            self.open(symbol, attempts);
        } else {
            info!("🔌 [FEED] {} no longer needed - staying closed", symbol);
            self.subscriptions.remove(symbol);
            self.cache.remove(symbol);
        }
    }
}

impl Drop for PriceFeedManager {
    fn drop(&mut self) {
        for (_, sub) in self.subscriptions.iter_mut() {
            sub.abort();
        }
    }
}

/// One connection attempt: connect, forward ticks, report the close.
async fn run_subscription(
    stream: Arc<dyn MarketDataStream>,
    symbol: String,
    generation: u64,
    tx: FeedEventSender,
) {
    match stream.connect(&symbol).await {
        Ok(mut messages) => {
            let _ = tx.send(FeedEvent::Connected { symbol: symbol.clone(), generation });

            while let Some(msg) = messages.next().await {
                match msg {
                    Ok(text) => match decode_ticker(&symbol, &text) {
                        Ok(tick) => {
                            let _ = tx.send(FeedEvent::Tick { generation, tick });
                        }
                        Err(e) => {
                            debug!(event = events::TICK_DISCARDED, "[FEED] Discarding message for {}: {}", symbol, e);
                        }
                    },
                    Err(e) => {
                        let _ = tx.send(FeedEvent::TransportError {
                            symbol: symbol.clone(),
                            generation,
                            error: e.to_string(),
                        });
                        break;
                    }
                }
            }
        }
        Err(e) => {
            let _ = tx.send(FeedEvent::ConnectFailed {
                symbol: symbol.clone(),
                generation,
                error: e.to_string(),
            });
        }
    }

    let _ = tx.send(FeedEvent::Closed { symbol, generation });
}
