use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::FeedError;

pub type FeedResult<T> = Result<T, FeedError>;

/// Raw text messages from one symbol's live subscription. The stream ending
/// means the transport closed.
pub type MessageStream = BoxStream<'static, FeedResult<String>>;

#[async_trait]
pub trait MarketDataStream: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open a live subscription for one symbol.
    async fn connect(&self, symbol: &str) -> FeedResult<MessageStream>;
}

#[async_trait]
pub trait PriceSnapshot: Send + Sync {
    /// One-shot request for the current price of a symbol.
    async fn fetch_price(&self, symbol: &str) -> FeedResult<f64>;
}
