use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::constants;
use crate::events::{Event, NotificationEvent};

/// Bounded history of notifications, most recent first.
#[derive(Clone)]
pub struct NotificationCenter {
    history: Arc<Mutex<VecDeque<NotificationEvent>>>,
    limit: usize,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(constants::notifications::HISTORY_LIMIT)
    }
}

impl NotificationCenter {
    pub fn new(limit: usize) -> Self {
        Self {
            history: Arc::new(Mutex::new(VecDeque::with_capacity(limit))),
            limit: limit.max(1),
        }
    }

    pub fn record(&self, event: NotificationEvent) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push_front(event);
        history.truncate(self.limit);
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<NotificationEvent> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().take(limit).cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop every entry; returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = history.len();
        history.clear();
        removed
    }

    /// Unread badge text: empty when there is nothing, capped at "99+".
    pub fn badge(&self) -> String {
        match self.count() {
            0 => String::new(),
            n if n > constants::notifications::BADGE_CAP => format!("{}+", constants::notifications::BADGE_CAP),
            n => n.to_string(),
        }
    }

    /// Record every notification published on the bus until it closes.
    pub fn start(&self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let center = self.clone();

        tokio::spawn(async move {
            info!("🔔 [NOTIFY] Notification center started (keeping {})", center.limit);
            loop {
                match rx.recv().await {
                    Ok(Event::Notification(event)) => {
                        info!("🔔 [NOTIFY] {}: {}", event.title, event.message);
                        center.record(event);
                    }
                    Ok(Event::Refresh) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("⚠️ [NOTIFY] Notification center lagged, {} event(s) dropped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("🔔 [NOTIFY] Notification center stopped");
        })
    }
}
