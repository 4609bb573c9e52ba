//! Per-cycle market mood aggregation

use crate::scorer;
use crate::types::{MarketMood, MarketState, NewsItem, Scope};

const BULLISH_THRESHOLD: f64 = 0.2;
const BEARISH_THRESHOLD: f64 = -0.2;

/// Sum the scores of the cycle's MARKET-scope items and derive a mood.
///
/// This is a per-cycle snapshot, not a running average: with no MARKET
/// items the result is the neutral zero state, and the previous cycle's
/// mood is never carried forward.
pub fn aggregate(items: &[NewsItem]) -> MarketState {
    let mut total = 0.0;
    let mut count = 0usize;

    for item in items {
        if item.scope == Scope::Market {
            total += scorer::score(item);
            count += 1;
        }
    }

    if count == 0 {
        return MarketState::default();
    }

    let mood = if total > BULLISH_THRESHOLD {
        MarketMood::Bullish
    } else if total < BEARISH_THRESHOLD {
        MarketMood::Bearish
    } else {
        MarketMood::Neutral
    };

    MarketState { mood, score: total }
}
