use std::collections::BTreeSet;

use tracing::{error, info, warn};

use crate::constants::events;
use crate::signals::types::{Signal, SignalStatus, SignalUpdate, ValidatedDraft};

use super::repository::SignalRepository;

/// Owns every signal record. Newest first; the full collection is persisted
/// after each mutation.
pub struct SignalStore {
    signals: Vec<Signal>,
    repository: Box<dyn SignalRepository>,
}

impl SignalStore {
    /// Load from the repository. Missing or unreadable storage starts empty.
    pub fn open(repository: Box<dyn SignalRepository>) -> Self {
        let signals = match repository.load() {
            Ok(Some(signals)) => {
                info!("📦 [STORE] Loaded {} signal(s)", signals.len());
                signals
            }
            Ok(None) => {
                info!("📦 [STORE] No saved signals - starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!("⚠️ [STORE] Saved signals unreadable ({}) - starting empty", e);
                Vec::new()
            }
        };
        Self { signals, repository }
    }

    pub fn create(&mut self, draft: ValidatedDraft, current_price: Option<f64>) -> Signal {
        let signal = Signal::from_draft(draft.into_inner(), current_price);
        info!(
            event = events::SIGNAL_CREATED,
            "📦 [STORE] Created {} {} signal {} (entry: {}, SL: {}, TP: {}, trigger: {:?})",
            signal.symbol, signal.direction, signal.id, signal.entry_price,
            signal.stop_loss_price, signal.take_profit_price, signal.trigger_price
        );
        self.signals.insert(0, signal.clone());
        self.persist();
        signal
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.signals.len();
        self.signals.retain(|s| s.id != id);
        if self.signals.len() == before {
            return false;
        }
        info!(event = events::SIGNAL_DELETED, "📦 [STORE] Deleted signal {}", id);
        self.persist();
        true
    }

    pub fn all(&self) -> &[Signal] {
        &self.signals
    }

    pub fn get(&self, id: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    pub fn filtered(&self, status: Option<SignalStatus>) -> Vec<Signal> {
        self.signals
            .iter()
            .filter(|s| status.map_or(true, |st| s.status == st))
            .cloned()
            .collect()
    }

    pub fn live(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.status.is_live())
    }

    /// Symbols with at least one active or triggered signal.
    pub fn needed_symbols(&self) -> BTreeSet<String> {
        self.live().map(|s| s.symbol.clone()).collect()
    }

    pub fn update(&mut self, id: &str, update: SignalUpdate) -> bool {
        let applied = self.apply_in_memory(id, update);
        if applied {
            self.persist();
        }
        applied
    }

    /// Apply several updates with a single persist. Returns how many matched.
    pub fn apply<I>(&mut self, updates: I) -> usize
    where
        I: IntoIterator<Item = (String, SignalUpdate)>,
    {
        let applied = updates
            .into_iter()
            .filter(|(id, update)| self.apply_in_memory(id, *update))
            .count();
        if applied > 0 {
            self.persist();
        }
        applied
    }

    fn apply_in_memory(&mut self, id: &str, update: SignalUpdate) -> bool {
        if update.is_empty() {
            return false;
        }
        match self.signals.iter_mut().find(|s| s.id == id) {
            Some(signal) => {
                update.apply_to(signal);
                true
            }
            None => false,
        }
    }

    fn persist(&self) {
        if let Err(e) = self.repository.save(&self.signals) {
            error!("❌ [STORE] Failed to persist {} signal(s): {}", self.signals.len(), e);
        }
    }
}
