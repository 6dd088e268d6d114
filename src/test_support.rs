//! Channel-backed doubles for the market data traits.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::error::FeedError;
use crate::events::{NotificationEvent, NotificationKind, NotificationSink};
use crate::exchange::traits::{FeedResult, MarketDataStream, MessageStream, PriceSnapshot};
use crate::services::price_feed::{FeedEvent, FeedEventReceiver};

type Outbox = mpsc::UnboundedSender<FeedResult<String>>;

/// Every `connect` opens a fresh channel; tests push messages or drop it to close.
#[derive(Clone, Default)]
pub struct ChannelStream {
    inner: Arc<Mutex<ChannelState>>,
}

#[derive(Default)]
struct ChannelState {
    senders: HashMap<String, Outbox>,
    connects: Vec<(String, Instant)>,
    refuse: HashSet<String>,
}

impl ChannelStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, symbol: &str, text: &str) {
        let state = self.inner.lock().unwrap();
        if let Some(tx) = state.senders.get(symbol) {
            let _ = tx.send(Ok(text.to_string()));
        }
    }

    pub fn push_price(&self, symbol: &str, price: f64) {
        self.push(symbol, &format!(r#"{{"e":"24hrTicker","s":"{}","c":"{}"}}"#, symbol, price));
    }

    pub fn fail(&self, symbol: &str, error: &str) {
        let state = self.inner.lock().unwrap();
        if let Some(tx) = state.senders.get(symbol) {
            let _ = tx.send(Err(FeedError::Transport(error.to_string())));
        }
    }

    /// Drop the live connection for `symbol`, ending its stream.
    pub fn close(&self, symbol: &str) {
        self.inner.lock().unwrap().senders.remove(symbol);
    }

    pub fn refuse(&self, symbol: &str) {
        self.inner.lock().unwrap().refuse.insert(symbol.to_string());
    }

    pub fn connects(&self, symbol: &str) -> usize {
        self.connect_times(symbol).len()
    }

    pub fn connect_times(&self, symbol: &str) -> Vec<Instant> {
        self.inner
            .lock()
            .unwrap()
            .connects
            .iter()
            .filter(|(s, _)| s == symbol)
            .map(|(_, t)| *t)
            .collect()
    }
}

#[async_trait]
impl MarketDataStream for ChannelStream {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn connect(&self, symbol: &str) -> FeedResult<MessageStream> {
        let mut state = self.inner.lock().unwrap();
        state.connects.push((symbol.to_string(), Instant::now()));
        if state.refuse.contains(symbol) {
            return Err(FeedError::Connect(format!("refused {}", symbol)));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.senders.insert(symbol.to_string(), tx);
        let messages = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|m| (m, rx)) });
        Ok(messages.boxed())
    }
}

/// Fixed snapshot prices; unknown symbols fail like an HTTP 400.
#[derive(Clone, Default)]
pub struct StaticSnapshot {
    prices: HashMap<String, f64>,
}

impl StaticSnapshot {
    pub fn with(prices: &[(&str, f64)]) -> Self {
        Self {
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
        }
    }
}

#[async_trait]
impl PriceSnapshot for StaticSnapshot {
    async fn fetch_price(&self, symbol: &str) -> FeedResult<f64> {
        self.prices.get(symbol).copied().ok_or_else(|| FeedError::Http {
            status: 400,
            body: r#"{"code":-1121,"msg":"Invalid symbol."}"#.to_string(),
        })
    }
}

pub async fn next_event(rx: &mut FeedEventReceiver) -> FeedEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("feed event channel closed")
}

/// Sink that remembers everything it was handed.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<NotificationEvent>>,
    refreshes: Mutex<usize>,
}

impl RecordingSink {
    pub fn notices(&self) -> Vec<NotificationEvent> {
        self.notices.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notices().iter().map(|n| n.kind).collect()
    }

    pub fn refreshes(&self) -> usize {
        *self.refreshes.lock().unwrap()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: NotificationEvent) {
        self.notices.lock().unwrap().push(event);
    }

    fn refresh(&self) {
        *self.refreshes.lock().unwrap() += 1;
    }
}
