//! News collection from external sources
//!
//! Each source fetches a small batch of recent headlines:
//! - RSS/Atom feeds (CoinDesk, CoinTelegraph, Decrypt, ...)
//! - Binance announcement API

pub mod binance;
pub mod rss;

use crate::error::Result;
use crate::types::RawNewsItem;
use async_trait::async_trait;

pub use binance::BinanceSource;
pub use rss::RssSource;

/// News source trait
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Display name, also used for trust weighting and id derivation
    fn name(&self) -> &str;

    /// Fetch the most recent headlines, newest first, up to the
    /// per-source limit.
    async fn fetch(&self) -> Result<Vec<RawNewsItem>>;
}
