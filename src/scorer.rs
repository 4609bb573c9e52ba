//! Trust-weighted scoring

use crate::types::NewsItem;

/// Sources whose announcements carry full weight. Matched as
/// case-insensitive substrings of the source name.
const EXCHANGE_SOURCES: &[&str] = &["binance", "coinbase", "exchange"];

const EXCHANGE_TRUST: f64 = 1.0;
const DEFAULT_TRUST: f64 = 0.7;

/// Credibility multiplier for a source name.
pub fn trust_weight(source: &str) -> f64 {
    let source = source.to_lowercase();
    if EXCHANGE_SOURCES.iter().any(|s| source.contains(s)) {
        EXCHANGE_TRUST
    } else {
        DEFAULT_TRUST
    }
}

/// Signed item score: impact x sentiment x trust weight.
pub fn score(item: &NewsItem) -> f64 {
    item.impact * item.sentiment * trust_weight(&item.source)
}
