//! News collection orchestrator
//!
//! Background service that drives the whole pipeline on a fixed cycle:
//! fan-out fetch, classification, dedup, market aggregation, rule
//! signals, persistence, and finally detached AI enrichment per item.

use crate::ai::Advisor;
use crate::classifier;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::market;
use crate::rules;
use crate::scorer;
use crate::sources::NewsSource;
use crate::storage::Database;
use crate::store::NewsStore;
use crate::types::{MarketState, NewsItem, Scope};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

pub struct Collector {
    config: EngineConfig,
    sources: Vec<Arc<dyn NewsSource>>,
    store: Arc<RwLock<NewsStore>>,
    db: Arc<Database>,
    advisor: Arc<dyn Advisor>,
    running: Arc<RwLock<bool>>,
    /// Item ids with an enrichment task currently in flight, so a slow
    /// model call is never duplicated for the same item.
    enriching: Arc<Mutex<HashSet<String>>>,
}

impl Collector {
    pub fn new(
        config: EngineConfig,
        sources: Vec<Arc<dyn NewsSource>>,
        store: Arc<RwLock<NewsStore>>,
        db: Arc<Database>,
        advisor: Arc<dyn Advisor>,
    ) -> Self {
        Self {
            config,
            sources,
            store,
            db,
            advisor,
            running: Arc::new(RwLock::new(false)),
            enriching: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start the collection loop (returns immediately, runs in background)
    pub async fn start(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(crate::error::BotError::Internal(
                    "Collector already running".into(),
                ));
            }
            *running = true;
        }

        info!(
            "[Collector] Starting, interval={}s, sources={}",
            self.config.cycle_interval_secs,
            self.sources.len()
        );

        let collector = self.clone_for_task();
        tokio::spawn(async move {
            collector.run_loop().await;
        });

        Ok(())
    }

    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("[Collector] Stopped");
    }

    /// Clone for spawning tasks (shares Arc references)
    fn clone_for_task(&self) -> Self {
        Self {
            config: self.config.clone(),
            sources: self.sources.clone(),
            store: Arc::clone(&self.store),
            db: Arc::clone(&self.db),
            advisor: Arc::clone(&self.advisor),
            running: Arc::clone(&self.running),
            enriching: Arc::clone(&self.enriching),
        }
    }

    async fn run_loop(&self) {
        let mut ticker = interval(Duration::from_secs(self.config.cycle_interval_secs));

        loop {
            ticker.tick().await;

            if !*self.running.read().await {
                break;
            }

            self.run_cycle().await;
        }
    }

    /// One full collection cycle. Returns the handles of the enrichment
    /// tasks it spawned; the loop drops them (enrichment is detached),
    /// tests await them.
    pub async fn run_cycle(&self) -> Vec<JoinHandle<()>> {
        let candidates = self.fetch_all().await;
        if candidates.is_empty() {
            return Vec::new();
        }

        // One write-lock section covers dedup through insertion, so a
        // reader sees each cycle as a whole or not at all.
        let (fresh, state) = {
            let mut store = self.store.write().await;

            let mut fresh = store.admit(candidates);
            if fresh.is_empty() {
                return Vec::new();
            }

            for item in &mut fresh {
                classifier::classify(item);
            }

            // Per-cycle market snapshot from this cycle's items only.
            // Cycles without new items never reach this point, so the
            // previous state stays visible between bursts of news.
            let state = market::aggregate(&fresh);

            for item in &mut fresh {
                if item.scope == Scope::Asset {
                    rules::apply(item, &state);
                    item.final_score = scorer::score(item);
                }
            }

            store.set_market_state(state);
            store.insert_cycle(fresh.clone());
            (fresh, state)
        };

        info!(
            "[Collector] Cycle complete: {} new items, market mood {} ({:.3})",
            fresh.len(),
            state.mood.as_str(),
            state.score
        );

        for item in &fresh {
            if let Err(e) = self.db.upsert(item).await {
                warn!("[Collector] Failed to persist {}: {}", item.id, e);
            }
        }

        let mut handles = Vec::new();
        for item in fresh {
            if let Some(handle) = self.spawn_enrichment(item, state).await {
                handles.push(handle);
            }
        }
        handles
    }

    /// Fan out to all sources concurrently and pool their batches in
    /// source order. A failing source costs this cycle its items, nothing
    /// more.
    async fn fetch_all(&self) -> Vec<NewsItem> {
        let mut tasks = Vec::new();
        for source in &self.sources {
            let source = Arc::clone(source);
            tasks.push(tokio::spawn(async move {
                let name = source.name().to_string();
                (name, source.fetch().await)
            }));
        }

        let mut candidates = Vec::new();
        for task in tasks {
            match task.await {
                Ok((name, Ok(raw))) => {
                    for raw_item in raw.into_iter().take(self.config.per_source_limit) {
                        candidates.push(raw_item.into_item(&name));
                    }
                }
                Ok((name, Err(e))) => {
                    warn!("[Collector] Fetch from {} failed: {}", name, e);
                }
                Err(e) => {
                    warn!("[Collector] Fetch task panicked: {}", e);
                }
            }
        }
        candidates
    }

    /// Spawn a detached enrichment task for one item, unless one is
    /// already in flight for the same id.
    async fn spawn_enrichment(
        &self,
        item: NewsItem,
        state: MarketState,
    ) -> Option<JoinHandle<()>> {
        {
            let mut enriching = self.enriching.lock().await;
            if !enriching.insert(item.id.clone()) {
                return None;
            }
        }

        let collector = self.clone_for_task();
        Some(tokio::spawn(async move {
            let advice = collector.advisor.advise(&item, &state).await;

            let merged = {
                let mut store = collector.store.write().await;
                store.merge_ai(&item.id, &advice)
            };

            // Evicted while the model was thinking: drop the result.
            if let Some(merged) = merged {
                if let Err(e) = collector.db.upsert(&merged).await {
                    warn!(
                        "[Collector] Failed to persist enrichment for {}: {}",
                        merged.id, e
                    );
                }
            }

            collector.enriching.lock().await.remove(&item.id);
        }))
    }
}
