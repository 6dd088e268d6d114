use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;
use crate::exchange::symbols::normalize_symbol;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Price has reached the trigger level for this direction.
    pub fn reached_trigger(self, price: f64, trigger: f64) -> bool {
        match self {
            Direction::Long => price >= trigger,
            Direction::Short => price <= trigger,
        }
    }

    pub fn hit_stop_loss(self, price: f64, stop_loss: f64) -> bool {
        match self {
            Direction::Long => price <= stop_loss,
            Direction::Short => price >= stop_loss,
        }
    }

    pub fn hit_take_profit(self, price: f64, take_profit: f64) -> bool {
        match self {
            Direction::Long => price >= take_profit,
            Direction::Short => price <= take_profit,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Active,
    Triggered,
    Stopped,
    Completed,
}

impl SignalStatus {
    /// Active and triggered signals still need prices.
    pub fn is_live(self) -> bool {
        matches!(self, SignalStatus::Active | SignalStatus::Triggered)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalStatus::Active => "active",
            SignalStatus::Triggered => "triggered",
            SignalStatus::Stopped => "stopped",
            SignalStatus::Completed => "completed",
        }
    }

    /// Parse a status filter; "all" and empty mean no filter.
    pub fn parse_filter(raw: &str) -> Result<Option<SignalStatus>, String> {
        match raw.trim().to_lowercase().as_str() {
            "" | "all" => Ok(None),
            "active" => Ok(Some(SignalStatus::Active)),
            "triggered" => Ok(Some(SignalStatus::Triggered)),
            "stopped" => Ok(Some(SignalStatus::Stopped)),
            "completed" => Ok(Some(SignalStatus::Completed)),
            other => Err(format!("unknown status filter '{}'", other)),
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin input for a new signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalDraft {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    /// Absent means the signal is armed without a trigger gate.
    #[serde(default)]
    pub trigger_price: Option<f64>,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SignalDraft {
    /// Normalize the symbol/notes and reject nonsensical level combinations.
    pub fn validate(mut self) -> Result<ValidatedDraft, SignalError> {
        let symbol = normalize_symbol(&self.symbol);
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SignalError::InvalidSymbol { symbol: self.symbol });
        }
        self.symbol = symbol;

        check_price("entryPrice", self.entry_price)?;
        check_price("stopLossPrice", self.stop_loss_price)?;
        check_price("takeProfitPrice", self.take_profit_price)?;
        if let Some(trigger) = self.trigger_price {
            check_price("triggerPrice", trigger)?;
        }

        let (entry, stop, target) = (self.entry_price, self.stop_loss_price, self.take_profit_price);
        let ordered = match self.direction {
            Direction::Long => stop < entry && entry < target,
            Direction::Short => target < entry && entry < stop,
        };
        if !ordered {
            let expected = match self.direction {
                Direction::Long => "stop loss < entry < take profit",
                Direction::Short => "take profit < entry < stop loss",
            };
            return Err(SignalError::InconsistentLevels {
                direction: self.direction,
                reason: format!(
                    "expected {} (entry={}, stop={}, target={})",
                    expected, entry, stop, target
                ),
            });
        }

        if let Some(trigger) = self.trigger_price {
            let (low, high) = if stop < target { (stop, target) } else { (target, stop) };
            if trigger <= low || trigger >= high {
                return Err(SignalError::InconsistentLevels {
                    direction: self.direction,
                    reason: format!(
                        "trigger {} must lie strictly between stop loss and take profit",
                        trigger
                    ),
                });
            }
        }

        self.notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(ValidatedDraft(self))
    }
}

/// A draft that passed [`SignalDraft::validate`]. Only obtainable from there.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedDraft(SignalDraft);

impl ValidatedDraft {
    pub fn into_inner(self) -> SignalDraft {
        self.0
    }
}

impl Deref for ValidatedDraft {
    type Target = SignalDraft;

    fn deref(&self) -> &SignalDraft {
        &self.0
    }
}

fn check_price(field: &'static str, value: f64) -> Result<(), SignalError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SignalError::InvalidPrice { field, value })
    }
}

/// A single alert definition and its live state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    #[serde(default)]
    pub trigger_price: Option<f64>,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: SignalStatus,
    #[serde(default)]
    pub current_price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    /// Build a fresh `active` signal from an already validated draft.
    pub fn from_draft(draft: SignalDraft, current_price: Option<f64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: draft.symbol,
            direction: draft.direction,
            entry_price: draft.entry_price,
            trigger_price: draft.trigger_price,
            stop_loss_price: draft.stop_loss_price,
            take_profit_price: draft.take_profit_price,
            notes: draft.notes,
            status: SignalStatus::Active,
            current_price,
            created_at: Utc::now(),
        }
    }

    /// Profit/loss in percent relative to entry; 0 until a price is known.
    pub fn pnl_pct(&self) -> f64 {
        let Some(current) = self.current_price else {
            return 0.0;
        };
        match self.direction {
            Direction::Long => (current - self.entry_price) / self.entry_price * 100.0,
            Direction::Short => (self.entry_price - current) / self.entry_price * 100.0,
        }
    }

    /// Signed two-decimal rendering, e.g. "+10.00%".
    pub fn pnl_display(&self) -> String {
        let pnl = self.pnl_pct();
        if pnl >= 0.0 {
            format!("+{:.2}%", pnl)
        } else {
            format!("{:.2}%", pnl)
        }
    }

    pub fn display_price(&self) -> f64 {
        self.current_price.unwrap_or(self.entry_price)
    }

    pub fn is_pending_trigger(&self) -> bool {
        self.status == SignalStatus::Active && self.trigger_price.is_some()
    }
}

/// Field-level mutation applied by the store. Only status and price ever change.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SignalUpdate {
    pub status: Option<SignalStatus>,
    pub current_price: Option<f64>,
}

impl SignalUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.current_price.is_none()
    }

    pub(crate) fn apply_to(&self, signal: &mut Signal) {
        if let Some(status) = self.status {
            signal.status = status;
        }
        if let Some(price) = self.current_price {
            signal.current_price = Some(price);
        }
    }
}

/// Aggregate counters for the dashboard header.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active: usize,
    pub pending_triggers: usize,
    pub total: usize,
    pub completed: usize,
    pub stopped: usize,
    pub success_rate_pct: f64,
    pub monitoring: bool,
}

impl DashboardStats {
    pub fn from_signals(signals: &[Signal], monitoring: bool) -> Self {
        let mut stats = DashboardStats {
            total: signals.len(),
            monitoring,
            ..Default::default()
        };
        for s in signals {
            match s.status {
                SignalStatus::Active | SignalStatus::Triggered => stats.active += 1,
                SignalStatus::Completed => stats.completed += 1,
                SignalStatus::Stopped => stats.stopped += 1,
            }
            if s.is_pending_trigger() {
                stats.pending_triggers += 1;
            }
        }
        let closed = stats.completed + stats.stopped;
        if closed > 0 {
            stats.success_rate_pct = (stats.completed as f64 / closed as f64 * 100.0).round();
        }
        stats
    }
}
