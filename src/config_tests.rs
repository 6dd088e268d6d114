//! Unit tests for configuration structures and parsing.

#[cfg(test)]
mod config_tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use crate::config::*;
    use crate::error::ConfigError;

    // ============= Defaults =============

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.monitor.tick_interval_ms, 2000);
        assert!(config.monitor.autostart);
        assert_eq!(config.feed.provider, "binance");
        assert!(config.feed.close_unused);
        assert_eq!(config.feed.reconnect.delay_ms, 5000);
        assert_eq!(config.feed.reconnect.backoff_multiplier, 1.0);
        assert!(config.feed.reconnect.max_attempts.is_none());
        assert_eq!(config.storage.path, Some(PathBuf::from("./data/signals.json")));
        assert_eq!(config.notifications.history_limit, 50);
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(2));

        let with_bom = AppConfig::from_yaml("\u{feff}").unwrap();
        assert_eq!(with_bom.feed.provider, "binance");
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
monitor:
  tick_interval_ms: 500
feed:
  close_unused: false
  reconnect:
    delay_ms: 1000
    backoff_multiplier: 2.0
    max_delay_ms: 8000
    max_attempts: 5
storage:
  path: null
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert!(config.monitor.autostart);
        assert!(config.storage.path.is_none());

        let settings = config.feed_settings();
        assert!(!settings.close_unused);
        assert_eq!(settings.reconnect.delay, Duration::from_secs(1));
        assert_eq!(settings.reconnect.multiplier, 2.0);
        assert_eq!(settings.reconnect.max_delay, Duration::from_secs(8));
        assert_eq!(settings.reconnect.max_attempts, Some(5));
        assert_eq!(config.snapshot_timeout(), Duration::from_secs(10));
    }

    // ============= Validation =============

    #[test]
    fn test_rejects_zero_tick() {
        let err = AppConfig::from_yaml("monitor:\n  tick_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_shrinking_backoff() {
        let err = AppConfig::from_yaml("feed:\n  reconnect:\n    backoff_multiplier: 0.5\n").unwrap_err();
        assert!(err.to_string().contains("backoff_multiplier"));
    }

    #[test]
    fn test_rejects_zero_history() {
        let err = AppConfig::from_yaml("notifications:\n  history_limit: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = AppConfig::from_yaml("monitor: [not, a, map").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    // ============= Files =============

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("signal_sentinel_missing_{}.yaml", uuid::Uuid::new_v4()));
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.monitor.tick_interval_ms, 2000);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("signal_sentinel_cfg_{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "server:\n  bind_addr: \"127.0.0.1:8080\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");

        let _ = std::fs::remove_file(&path);
    }
}
