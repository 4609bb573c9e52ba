//! Rule-based news classification
//!
//! Pure keyword heuristics over the lowercased title: market/asset scope,
//! asset detection, sentiment accumulation, impact overrides, and a price
//! action noise filter. Deterministic for a given title.

use crate::types::{NewsItem, Scope};

/// Market-wide (regulatory/macro) terms, matched as plain substrings.
const MARKET_KEYWORDS: &[&str] = &[
    "fed",
    "cpi",
    "sec",
    "etf",
    "regulation",
    "inflation",
    "interest rate",
    "macro",
    "economy",
];

/// Ticker -> aliases, in priority order. The first ticker with a matching
/// alias wins, which makes multi-asset titles resolve deterministically
/// (e.g. "ethereum outpaces bitcoin" classifies as BTC).
const ASSETS: &[(&str, &[&str])] = &[
    ("BTC", &["btc", "bitcoin"]),
    ("ETH", &["eth", "ethereum", "ether"]),
    ("SOL", &["sol", "solana"]),
    ("BNB", &["bnb", "binance"]),
    ("XRP", &["xrp", "ripple"]),
    ("ADA", &["ada", "cardano"]),
    ("DOGE", &["doge", "dogecoin"]),
    ("APT", &["apt", "aptos"]),
];

const BULLISH_KEYWORDS: &[&str] = &[
    "surges",
    "jumps",
    "breakout",
    "adds",
    "record high",
    "moon",
    "rally",
    "gains",
    "bullish",
    "outperform",
    "upgrade",
    "listing",
    "listed",
    "partnership",
    "collaboration",
    "legalizes",
    "adoption",
    "pushes",
    "above",
];

const BEARISH_KEYWORDS: &[&str] = &[
    "loses",
    "falls",
    "exit",
    "withdrawn",
    "bloodbath",
    "crash",
    "bearish",
    "drop",
    "down",
    "delisting",
    "delisted",
    "hack",
    "exploit",
    "compromised",
    "selloff",
    "backlash",
    "left",
    "outflow",
    "ban",
    "restrict",
    "lose",
    "losing",
];

/// Pure price-movement words; without a real event they mark noise.
const PRICE_KEYWORDS: &[&str] = &["surges", "jumps", "climbs", "pops", "falls", "drops", "slumps"];

/// Events that make a price move newsworthy anyway.
const EVENT_KEYWORDS: &[&str] = &[
    "listing",
    "delisting",
    "hack",
    "exploit",
    "partnership",
    "fed",
    "cpi",
    "sec",
    "etf",
    "regulation",
    "legalizes",
    "approves",
];

const SENTIMENT_STEP: f64 = 0.3;

/// Populate scope, asset, impact, and sentiment on a freshly fetched item.
pub fn classify(item: &mut NewsItem) {
    let title = item.title.to_lowercase();

    item.scope = Scope::Asset;
    item.asset = "ALT".to_string();
    item.impact = 0.3;
    item.sentiment = 0.0;

    // Market-wide detection first; a macro headline is never asset-scoped.
    if MARKET_KEYWORDS.iter().any(|kw| title.contains(kw)) {
        item.scope = Scope::Market;
        item.asset = "ALL".to_string();
        item.impact = 0.7;
    }

    // Asset detection with word boundaries ("sol" must not match inside
    // "solution"). Only for asset-scoped items; market items stay ALL.
    if item.scope == Scope::Asset {
        'detect: for (ticker, aliases) in ASSETS {
            for alias in *aliases {
                if contains_word(&title, alias) {
                    item.asset = (*ticker).to_string();
                    break 'detect;
                }
            }
        }
    }

    // Sentiment accumulates additively across all keyword hits.
    for kw in BULLISH_KEYWORDS {
        if contains_word(&title, kw) {
            item.sentiment += SENTIMENT_STEP;
        }
    }
    for kw in BEARISH_KEYWORDS {
        if contains_word(&title, kw) {
            item.sentiment -= SENTIMENT_STEP;
        }
    }

    // High-impact event overrides, later entries win.
    if title.contains("listing") || title.contains("listed") || title.contains("lists") {
        item.impact = 0.8;
    }
    if title.contains("delisting") || title.contains("delisted") {
        item.impact = 0.9;
    }
    if title.contains("hack") || title.contains("exploit") || title.contains("compromised") {
        item.impact = 1.0;
    }

    // Noise filter: a pure price move without an event is low impact,
    // regardless of any override above.
    let price_action = PRICE_KEYWORDS.iter().any(|kw| title.contains(kw));
    if price_action {
        let has_event = EVENT_KEYWORDS.iter().any(|kw| title.contains(kw));
        if !has_event {
            item.impact = 0.1;
        }
    }

    item.sentiment = item.sentiment.clamp(-1.0, 1.0);
}

/// Substring match that is valid only when the characters adjacent to the
/// matched span are not alphanumeric.
fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let at = start + pos;
        let end = at + word.len();
        let before_ok = haystack[..at]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn classified(title: &str) -> NewsItem {
        let mut item = NewsItem::new("id".into(), title.into(), "CoinDesk".into(), Utc::now());
        classify(&mut item);
        item
    }

    #[test]
    fn test_defaults_on_empty_title() {
        let item = classified("");
        assert_eq!(item.scope, Scope::Asset);
        assert_eq!(item.asset, "ALT");
        assert_eq!(item.impact, 0.3);
        assert_eq!(item.sentiment, 0.0);
    }

    #[test]
    fn test_market_keyword_sets_scope() {
        let item = classified("SEC delays decision on spot ETF");
        assert_eq!(item.scope, Scope::Market);
        assert_eq!(item.asset, "ALL");
        assert_eq!(item.impact, 0.7);
    }

    #[test]
    fn test_asset_detection_word_boundary() {
        let item = classified("Solana network upgrade ships");
        assert_eq!(item.asset, "SOL");

        // "sol" inside another word must not match
        let item = classified("New solution for payments");
        assert_eq!(item.asset, "ALT");
    }

    #[test]
    fn test_asset_tie_break_is_priority_ordered() {
        // Mentions both ETH and BTC; BTC is listed first in the table.
        let item = classified("Ethereum outpaces Bitcoin in daily volume");
        assert_eq!(item.asset, "BTC");
    }

    #[test]
    fn test_sentiment_accumulates_and_clamps() {
        // Two bullish hits
        let item = classified("Token rally continues after exchange listing");
        assert!((item.sentiment - 0.6).abs() < 1e-9);

        // Enough bearish hits to clamp at -1.0
        let item = classified("Bloodbath: crash, selloff and outflow as whales exit");
        assert_eq!(item.sentiment, -1.0);
    }

    #[test]
    fn test_impact_override_listing() {
        let item = classified("Binance lists XYZ token");
        assert_eq!(item.scope, Scope::Asset);
        assert_eq!(item.impact, 0.8);
        // XYZ is not in the alias table, but "binance" is a BNB alias
        assert_eq!(item.asset, "BNB");

        let item = classified("Exchange announces listing of new pairs");
        assert_eq!(item.impact, 0.8);
    }

    #[test]
    fn test_impact_override_precedence() {
        // hack beats delisting beats listing
        let item = classified("Exchange halts listing after hack");
        assert_eq!(item.impact, 1.0);
        let item = classified("Delisting notice follows listing review");
        assert_eq!(item.impact, 0.9);
    }

    #[test]
    fn test_noise_filter_forces_low_impact() {
        let item = classified("BTC surges 5%");
        assert_eq!(item.asset, "BTC");
        assert_eq!(item.impact, 0.1);
    }

    #[test]
    fn test_noise_filter_spares_real_events() {
        let item = classified("Token surges after exchange listing");
        assert_eq!(item.impact, 0.8);
    }

    #[test]
    fn test_contains_word_edges() {
        assert!(contains_word("btc hits new high", "btc"));
        assert!(contains_word("new high for btc", "btc"));
        assert!(contains_word("btc-usd pair", "btc"));
        assert!(!contains_word("xbtc pair", "btc"));
        assert!(!contains_word("btcx pair", "btc"));
        // second occurrence is the valid one
        assert!(contains_word("solsol sol", "sol"));
    }
}
