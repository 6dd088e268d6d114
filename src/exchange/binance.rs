//! Binance Spot REST adapter (price snapshot only).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{
    symbols::to_binance_rest_symbol,
    traits::{FeedResult, PriceSnapshot},
    types::parse_price,
};

use crate::error::FeedError;

#[derive(Clone)]
pub struct BinanceRest {
    client: Client,
    base_url: String,
}

#[derive(Deserialize, Debug)]
struct TickerPrice {
    price: String,
}

impl BinanceRest {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FeedResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn ticker_url(&self, symbol: &str) -> FeedResult<url::Url> {
        let mut url = url::Url::parse(&format!("{}/api/v3/ticker/price", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("symbol", &to_binance_rest_symbol(symbol));
        Ok(url)
    }
}

#[async_trait]
impl PriceSnapshot for BinanceRest {
    async fn fetch_price(&self, symbol: &str) -> FeedResult<f64> {
        let url = self.ticker_url(symbol)?;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(FeedError::Http { status: status.as_u16(), body: text });
        }

        let ticker: TickerPrice = serde_json::from_str(&text)?;
        parse_price(&ticker.price).ok_or_else(|| {
            FeedError::Malformed(format!("unusable snapshot price '{}' for {}", ticker.price, symbol))
        })
    }
}
