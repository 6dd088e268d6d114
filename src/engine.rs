//! The engine context: signal store, price feed and notification sink.
//!
//! Only the monitoring loop task owns an [`Engine`]; every mutation of signal
//! state or of the price cache goes through it, so no locking is needed.
//! Price ticks only touch the cache. Signal status changes only on [`Engine::tick`].

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::constants::events;
use crate::data::store::SignalStore;
use crate::events::{NotificationEvent, NotificationKind, NotificationSink};
use crate::services::price_feed::{FeedEvent, PriceFeedManager};
use crate::signals::evaluator::evaluate;
use crate::signals::types::{DashboardStats, Signal, SignalStatus, SignalUpdate, ValidatedDraft};

pub struct Engine {
    store: SignalStore,
    feed: PriceFeedManager,
    sink: Arc<dyn NotificationSink>,
    monitoring: bool,
}

impl Engine {
    pub fn new(store: SignalStore, feed: PriceFeedManager, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            feed,
            sink,
            monitoring: false,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn feed(&self) -> &PriceFeedManager {
        &self.feed
    }

    /// Store a new signal. `snapshot` is a price fetched just before
    /// creation; it seeds both the cache and the signal.
    pub fn create_signal(&mut self, draft: ValidatedDraft, snapshot: Option<f64>) -> Signal {
        if let Some(price) = snapshot {
            self.feed.seed_price(&draft.symbol, price);
        }
        let current_price = self.feed.latest_price(&draft.symbol).or(snapshot);
        let signal = self.store.create(draft, current_price);

        if self.monitoring && self.feed.ensure_subscribed(&signal.symbol) {
            info!("🔌 [MONITOR] Subscribed {} for new signal {}", signal.symbol, signal.id);
        }
        self.sink.refresh();
        signal
    }

    pub fn delete_signal(&mut self, id: &str) -> bool {
        if !self.store.delete(id) {
            return false;
        }
        let needed = self.store.needed_symbols();
        if self.monitoring {
            self.feed.unsubscribe_unused(&needed);
        }
        self.feed.prune_cache(&needed);
        self.sink.refresh();
        true
    }

    pub fn signals(&self, status: Option<SignalStatus>) -> Vec<Signal> {
        self.store.filtered(status)
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_signals(self.store.all(), self.monitoring)
    }

    /// Returns false when monitoring was already running.
    pub fn start_monitoring(&mut self) -> bool {
        if self.monitoring {
            return false;
        }
        self.monitoring = true;
        let needed = self.store.needed_symbols();
        info!("▶️ [MONITOR] Monitoring started ({} symbol(s) needed)", needed.len());
        for symbol in &needed {
            self.feed.ensure_subscribed(symbol);
        }
        self.sink.refresh();
        true
    }

    /// Returns false when monitoring was not running.
    pub fn stop_monitoring(&mut self) -> bool {
        if !self.monitoring {
            return false;
        }
        self.monitoring = false;
        self.feed.teardown();
        info!("⏹️ [MONITOR] Monitoring stopped");
        self.sink.refresh();
        true
    }

    /// One evaluation pass over every active or triggered signal.
    pub fn tick(&mut self) {
        let needed = self.store.needed_symbols();
        for symbol in &needed {
            if self.feed.ensure_subscribed(symbol) {
                debug!("[MONITOR] Subscribed {}", symbol);
            }
        }

        let mut updates = Vec::new();
        let mut notices = Vec::new();
        for signal in self.store.live() {
            let price = self.feed.latest_price(&signal.symbol).or(signal.current_price);
            let evaluation = evaluate(signal, price);
            if !evaluation.differs_from(signal) {
                continue;
            }
            if evaluation.status_changed(signal) {
                info!(
                    "📈 [MONITOR] {} {} {} -> {} at {:?}",
                    signal.symbol, signal.id, signal.status, evaluation.status, evaluation.current_price
                );
            }
            updates.push((
                signal.id.clone(),
                SignalUpdate {
                    status: evaluation.status_changed(signal).then_some(evaluation.status),
                    current_price: evaluation.current_price,
                },
            ));
            notices.extend(evaluation.events);
        }

        if !updates.is_empty() {
            self.store.apply(updates);
        }
        for notice in notices {
            log_transition(&notice);
            self.sink.notify(notice);
        }

        let needed = self.store.needed_symbols();
        self.feed.unsubscribe_unused(&needed);
        self.feed.prune_cache(&needed);
        self.sink.refresh();
    }

    /// Route an event from a subscription task or retry timer into the feed.
    pub fn handle_feed_event(&mut self, event: FeedEvent) {
        let needed = if self.monitoring {
            self.store.needed_symbols()
        } else {
            BTreeSet::new()
        };
        if let Some(notice) = self.feed.handle_event(event, &needed) {
            self.sink.notify(notice);
        }
    }

    /// Stop monitoring and release every subscription.
    pub fn shutdown(&mut self) {
        self.stop_monitoring();
        self.feed.teardown();
    }
}

fn log_transition(notice: &NotificationEvent) {
    let id = notice.signal_id.as_deref().unwrap_or("-");
    match notice.kind {
        NotificationKind::TriggerHit => {
            info!(event = events::TRIGGER_HIT, "🎯 [MONITOR] {} ({}): {}", notice.symbol, id, notice.message)
        }
        NotificationKind::StopLossHit => {
            warn!(event = events::STOP_LOSS_HIT, "🛑 [MONITOR] {} ({}): {}", notice.symbol, id, notice.message)
        }
        NotificationKind::TakeProfitHit => {
            info!(event = events::TAKE_PROFIT_HIT, "🎉 [MONITOR] {} ({}): {}", notice.symbol, id, notice.message)
        }
        _ => {}
    }
}
