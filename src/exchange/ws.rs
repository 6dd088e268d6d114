use async_trait::async_trait;
use futures_util::StreamExt;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::info;

use crate::error::FeedError;

use super::{
    symbols::to_binance_stream_symbol,
    traits::{FeedResult, MarketDataStream, MessageStream},
};

/// Binance per-symbol 24h ticker stream (`<symbol>@ticker`).
#[derive(Clone)]
pub struct BinanceTickerStream {
    base_url: String,
}

impl BinanceTickerStream {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn stream_url(&self, symbol: &str) -> FeedResult<url::Url> {
        let raw = format!("{}/{}@ticker", self.base_url, to_binance_stream_symbol(symbol));
        Ok(url::Url::parse(&raw)?)
    }
}

#[async_trait]
impl MarketDataStream for BinanceTickerStream {
    fn name(&self) -> &'static str {
        "binance"
    }

    async fn connect(&self, symbol: &str) -> FeedResult<MessageStream> {
        let url = self.stream_url(symbol)?;
        info!("Connecting to WS: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| FeedError::Connect(e.to_string()))?;

        // Pings are answered by tungstenite while the stream is polled.
        let messages = ws_stream.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(_) => None,
                Err(e) => Some(Err(FeedError::Transport(e.to_string()))),
            }
        });

        Ok(messages.boxed())
    }
}
