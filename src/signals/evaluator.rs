//! Trigger / stop-loss / take-profit state machine.
//!
//! Every check sees the status the signal had when the tick started:
//!
//! 1. `active -> triggered` when a trigger is set and price crosses it.
//! 2. `active|triggered -> stopped` when price crosses the stop loss.
//! 3. `active|triggered -> completed` when price crosses the take profit.
//!
//! Stop loss wins over take profit. If a trigger and an exit fire on the same
//! tick the signal ends in the exit state and both events are emitted, trigger
//! first.
//! `stopped` and `completed` are absorbing.

use crate::events::NotificationEvent;

use super::types::{Signal, SignalStatus};

/// Outcome of evaluating one signal against one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub status: SignalStatus,
    pub current_price: Option<f64>,
    /// In emission order
    pub events: Vec<NotificationEvent>,
}

impl Evaluation {
    pub fn status_changed(&self, signal: &Signal) -> bool {
        self.status != signal.status
    }

    pub fn differs_from(&self, signal: &Signal) -> bool {
        self.status != signal.status || self.current_price != signal.current_price
    }
}

/// Decide the next status for `signal` given the latest price, if any.
pub fn evaluate(signal: &Signal, price: Option<f64>) -> Evaluation {
    if signal.status.is_terminal() {
        return Evaluation {
            status: signal.status,
            current_price: signal.current_price,
            events: Vec::new(),
        };
    }

    let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0) else {
        // No usable price this tick: show entry, skip transition checks.
        return Evaluation {
            status: signal.status,
            current_price: Some(signal.entry_price),
            events: Vec::new(),
        };
    };

    let direction = signal.direction;
    let mut status = signal.status;
    let mut events = Vec::new();

    if signal.status == SignalStatus::Active {
        if let Some(trigger) = signal.trigger_price {
            if direction.reached_trigger(price, trigger) {
                status = SignalStatus::Triggered;
                events.push(NotificationEvent::trigger_hit(signal, price));
            }
        }
    }

    if direction.hit_stop_loss(price, signal.stop_loss_price) {
        status = SignalStatus::Stopped;
        events.push(NotificationEvent::stop_loss_hit(signal, price));
    } else if direction.hit_take_profit(price, signal.take_profit_price) {
        status = SignalStatus::Completed;
        events.push(NotificationEvent::take_profit_hit(signal, price));
    }

    Evaluation {
        status,
        current_price: Some(price),
        events,
    }
}
