use std::sync::Arc;

use crate::{config::AppConfig, error::ConfigError};

use super::{
    binance::BinanceRest,
    traits::{MarketDataStream, PriceSnapshot},
    ws::BinanceTickerStream,
};

pub fn build_feed(
    config: &AppConfig,
) -> Result<(Arc<dyn MarketDataStream>, Arc<dyn PriceSnapshot>), ConfigError> {
    match config.feed.provider.to_lowercase().as_str() {
        "binance" => {
            let stream = BinanceTickerStream::new(config.feed.ws_base_url.clone());
            let rest = BinanceRest::new(config.feed.rest_base_url.clone(), config.snapshot_timeout())
                .map_err(|e| ConfigError::Invalid(format!("failed to build Binance REST client: {}", e)))?;
            Ok((Arc::new(stream), Arc::new(rest)))
        }
        other => Err(ConfigError::Invalid(format!(
            "Unknown feed.provider='{}' (expected binance)",
            other
        ))),
    }
}
