//! In-memory news store
//!
//! The single source of truth for the running process: a bounded,
//! newest-first item list, the set of already-seen ids, and the latest
//! market state. The collector and the read API share one instance behind
//! `Arc<RwLock<NewsStore>>`; all methods here are synchronous and expect
//! the caller to hold the appropriate lock.

use crate::ai::AiAdvice;
use crate::types::{MarketState, NewsItem, TradingSignal};
use std::collections::HashSet;

pub const DEFAULT_MAX_ITEMS: usize = 100;
pub const DEFAULT_MAX_SEEN_IDS: usize = 5000;

pub struct NewsStore {
    items: Vec<NewsItem>,
    seen_ids: HashSet<String>,
    market_state: MarketState,
    max_items: usize,
    max_seen_ids: usize,
}

impl NewsStore {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_ITEMS, DEFAULT_MAX_SEEN_IDS)
    }

    pub fn with_limits(max_items: usize, max_seen_ids: usize) -> Self {
        Self {
            items: Vec::new(),
            seen_ids: HashSet::new(),
            market_state: MarketState::default(),
            max_items,
            max_seen_ids,
        }
    }

    /// Seed the store from durable storage at startup. Items are expected
    /// newest-first, as returned by `Database::load_recent`.
    pub fn bootstrap(&mut self, items: Vec<NewsItem>) {
        for item in items {
            self.seen_ids.insert(item.id.clone());
            self.items.push(item);
        }
        self.items.truncate(self.max_items);
    }

    /// Filter candidates down to never-seen items and mark them seen.
    /// Within one batch, a duplicated id is admitted once.
    pub fn admit(&mut self, candidates: Vec<NewsItem>) -> Vec<NewsItem> {
        let mut fresh = Vec::new();
        for item in candidates {
            if self.seen_ids.insert(item.id.clone()) {
                fresh.push(item);
            }
        }
        fresh
    }

    /// Prepend a cycle's new items as a block (newest-first overall order),
    /// enforce the item cap, and garbage-collect the seen-id set.
    pub fn insert_cycle(&mut self, mut new_items: Vec<NewsItem>) {
        if !new_items.is_empty() {
            new_items.append(&mut self.items);
            self.items = new_items;
            self.items.truncate(self.max_items);
        }

        // The rebuild keeps only ids still present in `items`, so an
        // evicted id can resurface as "new" if its source republishes it.
        if self.seen_ids.len() > self.max_seen_ids {
            self.seen_ids = self.items.iter().map(|i| i.id.clone()).collect();
            tracing::info!(
                "[Store] Seen-id cap exceeded, rebuilt from {} live items",
                self.items.len()
            );
        }
    }

    pub fn set_market_state(&mut self, state: MarketState) {
        self.market_state = state;
    }

    /// Merge an AI advice into the item with the given id.
    ///
    /// Analysis/advice/coin always overwrite, even when empty. The trading
    /// signal is overwritten only when the AI signal is something other
    /// than WAIT. Returns the merged item, or `None` when the item has been
    /// evicted in the meantime (the merge is then a no-op).
    pub fn merge_ai(&mut self, id: &str, advice: &AiAdvice) -> Option<NewsItem> {
        let item = self.items.iter_mut().find(|i| i.id == id)?;
        item.ai_analysis = advice.analysis.clone();
        item.ai_advice = advice.advice.clone();
        item.coin_symbol = advice.coin.clone();
        if advice.signal != TradingSignal::Wait {
            item.trading_signal = Some(advice.signal);
        }
        Some(item.clone())
    }

    /// Point-in-time copy of the item list, newest-first.
    pub fn snapshot_items(&self) -> Vec<NewsItem> {
        self.items.clone()
    }

    pub fn market_state(&self) -> MarketState {
        self.market_state
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }
}

impl Default for NewsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketMood, TradingSignal};
    use chrono::Utc;

    fn item(id: &str) -> NewsItem {
        NewsItem::new(id.into(), format!("title {id}"), "CoinDesk".into(), Utc::now())
    }

    fn advice(signal: TradingSignal) -> AiAdvice {
        AiAdvice {
            analysis: "context".into(),
            advice: "advice".into(),
            coin: "BTC".into(),
            signal,
        }
    }

    #[test]
    fn test_admit_dedups_against_seen() {
        let mut store = NewsStore::new();
        let fresh = store.admit(vec![item("a"), item("b")]);
        assert_eq!(fresh.len(), 2);
        store.insert_cycle(fresh);

        let fresh = store.admit(vec![item("a"), item("c")]);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "c");
    }

    #[test]
    fn test_admit_dedups_within_batch() {
        let mut store = NewsStore::new();
        let fresh = store.admit(vec![item("a"), item("a")]);
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_insert_prepends_as_block() {
        let mut store = NewsStore::new();
        store.insert_cycle(vec![item("old1"), item("old2")]);
        store.insert_cycle(vec![item("new1"), item("new2")]);

        let ids: Vec<_> = store.snapshot_items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, vec!["new1", "new2", "old1", "old2"]);
    }

    #[test]
    fn test_item_cap_keeps_most_recent() {
        let mut store = NewsStore::new();
        for batch in 0..15 {
            let items: Vec<_> = (0..10).map(|i| item(&format!("{batch}-{i}"))).collect();
            let fresh = store.admit(items);
            store.insert_cycle(fresh);
        }
        assert_eq!(store.len(), DEFAULT_MAX_ITEMS);
        // newest batch is at the front, oldest batches evicted
        let items = store.snapshot_items();
        assert_eq!(items[0].id, "14-0");
        assert!(items.iter().all(|i| {
            let batch: usize = i.id.split('-').next().unwrap().parse().unwrap();
            batch >= 5
        }));
    }

    #[test]
    fn test_seen_ids_rebuilt_from_live_items() {
        let mut store = NewsStore::with_limits(10, 50);
        for n in 0..60 {
            let fresh = store.admit(vec![item(&n.to_string())]);
            store.insert_cycle(fresh);
        }
        // cap was crossed, so the set now holds exactly the live ids
        assert_eq!(store.seen_count(), store.len());

        // an evicted id is admitted again after the rebuild
        let fresh = store.admit(vec![item("0")]);
        assert_eq!(fresh.len(), 1);
    }

    #[test]
    fn test_bootstrap_marks_seen() {
        let mut store = NewsStore::new();
        store.bootstrap(vec![item("a"), item("b")]);
        assert_eq!(store.len(), 2);
        assert!(store.admit(vec![item("a")]).is_empty());
    }

    #[test]
    fn test_merge_ai_overrides_signal() {
        let mut store = NewsStore::new();
        let mut it = item("a");
        it.trading_signal = Some(TradingSignal::Buy);
        store.insert_cycle(vec![it]);

        let merged = store.merge_ai("a", &advice(TradingSignal::StrongBuy)).unwrap();
        assert_eq!(merged.trading_signal, Some(TradingSignal::StrongBuy));
        assert_eq!(merged.ai_analysis, "context");
        assert_eq!(merged.coin_symbol, "BTC");
    }

    #[test]
    fn test_merge_ai_wait_preserves_signal() {
        let mut store = NewsStore::new();
        let mut it = item("a");
        it.trading_signal = Some(TradingSignal::Buy);
        store.insert_cycle(vec![it]);

        let merged = store.merge_ai("a", &advice(TradingSignal::Wait)).unwrap();
        assert_eq!(merged.trading_signal, Some(TradingSignal::Buy));
        // text fields still overwrite
        assert_eq!(merged.ai_advice, "advice");
    }

    #[test]
    fn test_merge_ai_evicted_is_noop() {
        let mut store = NewsStore::new();
        store.insert_cycle(vec![item("a")]);
        assert!(store.merge_ai("gone", &advice(TradingSignal::Buy)).is_none());
    }

    #[test]
    fn test_market_state_roundtrip() {
        let mut store = NewsStore::new();
        store.set_market_state(MarketState {
            mood: MarketMood::Bullish,
            score: 0.4,
        });
        assert_eq!(store.market_state().mood, MarketMood::Bullish);
    }
}
