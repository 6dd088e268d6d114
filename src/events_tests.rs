//! Unit tests for notification events.

#[cfg(test)]
mod events_tests {
    use crate::events::*;
    use crate::signals::types::{Direction, Signal, SignalDraft};

    fn signal() -> Signal {
        Signal::from_draft(
            SignalDraft {
                symbol: "BTCUSDT".to_string(),
                direction: Direction::Long,
                entry_price: 100.0,
                trigger_price: Some(110.0),
                stop_loss_price: 90.0,
                take_profit_price: 120.0,
                notes: None,
            },
            None,
        )
    }

    // ============= Feed notices =============

    #[test]
    fn test_feed_notices() {
        let connected = NotificationEvent::feed_connected("ETHUSDT");
        assert_eq!(connected.kind, NotificationKind::Connected);
        assert_eq!(connected.title, "Connected");
        assert_eq!(connected.message, "Real-time feed active for ETHUSDT");
        assert!(connected.signal_id.is_none());

        let error = NotificationEvent::feed_error("ETHUSDT");
        assert_eq!(error.kind, NotificationKind::ConnectionError);
        assert_eq!(error.message, "Lost connection to ETHUSDT feed. Retrying...");

        let failed = NotificationEvent::feed_failed("ETHUSDT");
        assert_eq!(failed.kind, NotificationKind::ConnectionFailed);
        assert_eq!(failed.title, "Connection Failed");
    }

    // ============= Signal transitions =============

    #[test]
    fn test_transition_messages() {
        let s = signal();

        let trigger = NotificationEvent::trigger_hit(&s, 110.0);
        assert_eq!(trigger.kind, NotificationKind::TriggerHit);
        assert_eq!(trigger.signal_id.as_deref(), Some(s.id.as_str()));
        assert_eq!(trigger.message, "BTCUSDT reached trigger price: $110.00");

        let stop = NotificationEvent::stop_loss_hit(&s, 89.5);
        assert_eq!(stop.title, "Stop Loss Hit 🛑");
        assert_eq!(stop.message, "BTCUSDT hit stop loss at $89.50");

        let target = NotificationEvent::take_profit_hit(&s, 120.0);
        assert_eq!(target.kind, NotificationKind::TakeProfitHit);
        assert_eq!(target.message, "BTCUSDT reached take profit at $120.00!");
    }

    #[test]
    fn test_notification_json_shape() {
        let event = NotificationEvent::stop_loss_hit(&signal(), 85.0);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "stop_loss_hit");
        assert_eq!(json["symbol"], "BTCUSDT");
        assert!(json["signalId"].is_string());
        assert!(json["emittedAt"].is_string());
    }
}
