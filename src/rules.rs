//! Context-aware trading rule engine
//!
//! Stateless: each invocation depends only on the item's score and the
//! cycle's market state.

use crate::scorer;
use crate::types::{MarketMood, MarketState, NewsItem, TradingSignal};

/// Scores below this magnitude are noise.
const NOISE_THRESHOLD: f64 = 0.05;
/// Magnitude required to act in either direction.
const ACTION_THRESHOLD: f64 = 0.1;

/// Attach `trading_signal` and `rule_reason` to an ASSET-scope item.
///
/// The bearish branch is evaluated after the bullish one and overwrites it
/// when both trigger; callers rely on that ordering.
pub fn apply(item: &mut NewsItem, market: &MarketState) {
    let asset_score = scorer::score(item);

    item.trading_signal = Some(TradingSignal::Wait);
    item.rule_reason = "Low impact or neutral signal".to_string();

    if asset_score.abs() < NOISE_THRESHOLD {
        item.trading_signal = Some(TradingSignal::Ignore);
        item.rule_reason = "Noise / Insufficient Impact".to_string();
        return;
    }

    if asset_score > ACTION_THRESHOLD {
        match market.mood {
            MarketMood::Bearish => {
                item.trading_signal = Some(TradingSignal::Caution);
                item.rule_reason =
                    "Asset Bullish but Market is Bearish (High Risk)".to_string();
            }
            MarketMood::Bullish => {
                item.trading_signal = Some(TradingSignal::StrongBuy);
                item.rule_reason =
                    "Asset Bullish + Market Bullish (Trend Confirmation)".to_string();
            }
            MarketMood::Neutral => {
                item.trading_signal = Some(TradingSignal::Buy);
                item.rule_reason = "Asset Bullish in Neutral Market".to_string();
            }
        }
    }

    if asset_score < -ACTION_THRESHOLD {
        match market.mood {
            MarketMood::Bullish => {
                item.trading_signal = Some(TradingSignal::CautionSell);
                item.rule_reason =
                    "Asset Bearish but Market is Bullish (Potential Dip Buy?)".to_string();
            }
            MarketMood::Bearish => {
                item.trading_signal = Some(TradingSignal::StrongSell);
                item.rule_reason =
                    "Asset Bearish + Market Bearish (Trend Confirmation)".to_string();
            }
            MarketMood::Neutral => {
                item.trading_signal = Some(TradingSignal::Sell);
                item.rule_reason = "Asset Bearish in Neutral Market".to_string();
            }
        }
    }
}
