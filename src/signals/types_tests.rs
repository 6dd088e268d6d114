//! Unit tests for signal types: validation, PnL and serialization shape.

#[cfg(test)]
mod types_tests {
    use chrono::Utc;

    use crate::error::SignalError;
    use crate::signals::types::*;

    fn long_draft() -> SignalDraft {
        SignalDraft {
            symbol: " btc/usdt ".to_string(),
            direction: Direction::Long,
            entry_price: 100.0,
            trigger_price: Some(110.0),
            stop_loss_price: 90.0,
            take_profit_price: 120.0,
            notes: Some("  breakout  ".to_string()),
        }
    }

    fn with_price(direction: Direction, current: Option<f64>) -> Signal {
        let mut s = Signal::from_draft(
            SignalDraft {
                symbol: "ETHUSDT".to_string(),
                direction,
                entry_price: 100.0,
                trigger_price: None,
                stop_loss_price: if direction == Direction::Long { 90.0 } else { 110.0 },
                take_profit_price: if direction == Direction::Long { 120.0 } else { 80.0 },
                notes: None,
            },
            None,
        );
        s.current_price = current;
        s
    }

    // ============= Validation =============

    #[test]
    fn test_validate_normalizes_symbol_and_notes() {
        let draft = long_draft().validate().unwrap();
        assert_eq!(draft.symbol, "BTCUSDT");
        assert_eq!(draft.notes.as_deref(), Some("breakout"));
    }

    #[test]
    fn test_validated_draft_builds_signal_unchanged() {
        let validated = long_draft().validate().unwrap();
        let inner = validated.clone().into_inner();
        assert_eq!(inner.clone().validate().unwrap(), validated);

        let signal = Signal::from_draft(inner, Some(101.0));
        assert_eq!(signal.symbol, validated.symbol);
        assert_eq!(signal.entry_price, validated.entry_price);
        assert_eq!(signal.notes, validated.notes);
    }

    #[test]
    fn test_validate_blank_notes_become_none() {
        let mut draft = long_draft();
        draft.notes = Some("   ".to_string());
        assert_eq!(draft.validate().unwrap().notes, None);
    }

    #[test]
    fn test_validate_rejects_bad_symbol() {
        let mut draft = long_draft();
        draft.symbol = "BTC USDT!".to_string();
        assert!(matches!(draft.validate(), Err(SignalError::InvalidSymbol { .. })));

        let mut draft = long_draft();
        draft.symbol = "  ".to_string();
        assert!(matches!(draft.validate(), Err(SignalError::InvalidSymbol { .. })));
    }

    #[test]
    fn test_validate_rejects_non_positive_prices() {
        let mut draft = long_draft();
        draft.entry_price = 0.0;
        assert!(matches!(
            draft.validate(),
            Err(SignalError::InvalidPrice { field: "entryPrice", .. })
        ));

        let mut draft = long_draft();
        draft.take_profit_price = f64::NAN;
        assert!(matches!(
            draft.validate(),
            Err(SignalError::InvalidPrice { field: "takeProfitPrice", .. })
        ));

        let mut draft = long_draft();
        draft.trigger_price = Some(-1.0);
        assert!(matches!(
            draft.validate(),
            Err(SignalError::InvalidPrice { field: "triggerPrice", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_long_levels_on_wrong_side() {
        let mut draft = long_draft();
        draft.stop_loss_price = 105.0;
        assert!(matches!(
            draft.validate(),
            Err(SignalError::InconsistentLevels { direction: Direction::Long, .. })
        ));
    }

    #[test]
    fn test_validate_short_levels() {
        let draft = SignalDraft {
            symbol: "SOLUSDT".to_string(),
            direction: Direction::Short,
            entry_price: 100.0,
            trigger_price: Some(95.0),
            stop_loss_price: 110.0,
            take_profit_price: 80.0,
            notes: None,
        };
        assert!(draft.clone().validate().is_ok());

        let mut flipped = draft;
        flipped.stop_loss_price = 80.0;
        flipped.take_profit_price = 110.0;
        assert!(matches!(
            flipped.validate(),
            Err(SignalError::InconsistentLevels { direction: Direction::Short, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_trigger_outside_band() {
        let mut draft = long_draft();
        draft.trigger_price = Some(125.0);
        assert!(matches!(draft.validate(), Err(SignalError::InconsistentLevels { .. })));

        let mut draft = long_draft();
        draft.trigger_price = Some(90.0);
        assert!(matches!(draft.validate(), Err(SignalError::InconsistentLevels { .. })));
    }

    // ============= PnL =============

    #[test]
    fn test_pnl_long() {
        let s = with_price(Direction::Long, Some(110.0));
        assert!((s.pnl_pct() - 10.0).abs() < 1e-9);
        assert_eq!(s.pnl_display(), "+10.00%");
    }

    #[test]
    fn test_pnl_short() {
        let s = with_price(Direction::Short, Some(90.0));
        assert!((s.pnl_pct() - 10.0).abs() < 1e-9);
        assert_eq!(s.pnl_display(), "+10.00%");
    }

    #[test]
    fn test_pnl_negative() {
        let s = with_price(Direction::Long, Some(95.0));
        assert_eq!(s.pnl_display(), "-5.00%");
    }

    #[test]
    fn test_pnl_without_price_is_zero() {
        let s = with_price(Direction::Long, None);
        assert_eq!(s.pnl_pct(), 0.0);
        assert_eq!(s.display_price(), 100.0);
    }

    // ============= Status =============

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(SignalStatus::parse_filter("all"), Ok(None));
        assert_eq!(SignalStatus::parse_filter(""), Ok(None));
        assert_eq!(
            SignalStatus::parse_filter("Triggered"),
            Ok(Some(SignalStatus::Triggered))
        );
        assert!(SignalStatus::parse_filter("pending").is_err());
    }

    #[test]
    fn test_live_and_terminal() {
        assert!(SignalStatus::Active.is_live());
        assert!(SignalStatus::Triggered.is_live());
        assert!(SignalStatus::Stopped.is_terminal());
        assert!(SignalStatus::Completed.is_terminal());
    }

    // ============= Stats =============

    #[test]
    fn test_dashboard_stats() {
        let mut signals = Vec::new();
        let mut pending = with_price(Direction::Long, None);
        pending.trigger_price = Some(110.0);
        signals.push(pending);
        let mut triggered = with_price(Direction::Long, None);
        triggered.status = SignalStatus::Triggered;
        signals.push(triggered);
        for status in [SignalStatus::Completed, SignalStatus::Completed, SignalStatus::Stopped] {
            let mut s = with_price(Direction::Short, None);
            s.status = status;
            signals.push(s);
        }

        let stats = DashboardStats::from_signals(&signals, true);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.pending_triggers, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.stopped, 1);
        assert_eq!(stats.success_rate_pct, 67.0);
        assert!(stats.monitoring);
    }

    #[test]
    fn test_dashboard_stats_empty() {
        let stats = DashboardStats::from_signals(&[], false);
        assert_eq!(stats.success_rate_pct, 0.0);
        assert_eq!(stats.total, 0);
    }

    // ============= Serialization =============

    #[test]
    fn test_signal_json_shape() {
        let s = Signal {
            id: "abc".to_string(),
            symbol: "BTCUSDT".to_string(),
            direction: Direction::Short,
            entry_price: 100.0,
            trigger_price: None,
            stop_loss_price: 110.0,
            take_profit_price: 80.0,
            notes: None,
            status: SignalStatus::Triggered,
            current_price: Some(99.5),
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["direction"], "SHORT");
        assert_eq!(v["status"], "triggered");
        assert_eq!(v["entryPrice"], 100.0);
        assert_eq!(v["currentPrice"], 99.5);
        assert!(v["triggerPrice"].is_null());
    }

    #[test]
    fn test_draft_deserialize_without_optionals() {
        let json = r#"{
            "symbol": "ethusdt",
            "direction": "LONG",
            "entryPrice": 3000.0,
            "stopLossPrice": 2900.0,
            "takeProfitPrice": 3300.0
        }"#;
        let draft: SignalDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.trigger_price, None);
        assert_eq!(draft.notes, None);
        assert_eq!(draft.validate().unwrap().symbol, "ETHUSDT");
    }
}
