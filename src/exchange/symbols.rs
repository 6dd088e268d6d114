/// Simple symbol normalization helpers.
///
/// Canonical symbol (used internally): uppercase, no separators, e.g. "BTCUSDT".
///
/// Exchange mappings:
/// - Binance streams: "btcusdt"
/// - Binance REST:    "BTCUSDT"

pub fn normalize_symbol(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .collect::<String>()
        .to_uppercase()
}

pub fn to_binance_stream_symbol(canonical: &str) -> String {
    normalize_symbol(canonical).to_lowercase()
}

pub fn to_binance_rest_symbol(canonical: &str) -> String {
    normalize_symbol(canonical)
}
