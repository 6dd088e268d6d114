use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeedError;

/// One price update for a symbol. Only the latest per symbol is kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl PriceTick {
    pub fn now(symbol: &str, price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price,
            observed_at: Utc::now(),
        }
    }
}

/// Parse a textual price; accepted only when finite and positive.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Read a price that may arrive as a JSON string or number.
pub fn price_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => parse_price(s),
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p > 0.0),
        _ => None,
    }
}

/// Decode a 24h ticker message (`c` = last price, `E` = event time in ms).
pub fn decode_ticker(symbol: &str, text: &str) -> Result<PriceTick, FeedError> {
    let payload: Value = serde_json::from_str(text)?;

    let raw = payload
        .get("c")
        .ok_or_else(|| FeedError::Malformed(format!("missing 'c' field for {}", symbol)))?;
    let price = price_from_value(raw)
        .ok_or_else(|| FeedError::Malformed(format!("unusable price {} for {}", raw, symbol)))?;

    let observed_at = payload
        .get("E")
        .and_then(Value::as_i64)
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now);

    Ok(PriceTick {
        symbol: symbol.to_string(),
        price,
        observed_at,
    })
}
