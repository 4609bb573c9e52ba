//! Read API
//!
//! Small JSON surface over the in-memory store:
//! - `GET /api/news` - current items, newest first
//! - `GET /api/market` - latest market state
//! - `GET /health` - liveness probe
//!
//! Responses are point-in-time snapshots; handlers only hold the read
//! lock long enough to clone.

use crate::store::NewsStore;
use crate::types::{MarketState, NewsItem};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<NewsStore>>,
}

pub fn create_app(state: AppState) -> Router {
    // CORS layer for the dashboard frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/api/news", get(get_news))
        .route("/api/market", get(get_market))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn get_news(State(state): State<AppState>) -> Json<Vec<NewsItem>> {
    let items = state.store.read().await.snapshot_items();
    Json(items)
}

async fn get_market(State(state): State<AppState>) -> Json<MarketState> {
    let market = state.store.read().await.market_state();
    Json(market)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    items: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let items = state.store.read().await.len();
    Json(HealthResponse {
        status: "healthy",
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketMood, MarketState};
    use chrono::Utc;

    fn state_with_items(n: usize) -> AppState {
        let mut store = NewsStore::new();
        let items = (0..n)
            .map(|i| {
                NewsItem::new(
                    format!("id-{i}"),
                    format!("title {i}"),
                    "CoinDesk".into(),
                    Utc::now(),
                )
            })
            .collect();
        store.insert_cycle(items);
        store.set_market_state(MarketState {
            mood: MarketMood::Bullish,
            score: 0.3,
        });
        AppState {
            store: Arc::new(RwLock::new(store)),
        }
    }

    #[tokio::test]
    async fn test_news_snapshot() {
        let state = state_with_items(3);
        let Json(items) = get_news(State(state)).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "id-0");
    }

    #[tokio::test]
    async fn test_market_snapshot() {
        let state = state_with_items(0);
        let Json(market) = get_market(State(state)).await;
        assert_eq!(market.mood, MarketMood::Bullish);
    }

    #[test]
    fn test_health() {
        let state = state_with_items(2);
        let Json(resp) = tokio_test::block_on(health(State(state)));
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.items, 2);
    }

    #[test]
    fn test_create_app() {
        let _app = create_app(state_with_items(0));
    }
}
