//! Binance announcement source
//!
//! Queries the public announcement catalog API (catalog 48 = "New
//! Cryptocurrency Listing") instead of scraping the announcement page.

use super::NewsSource;
use crate::error::{BotError, Result};
use crate::types::RawNewsItem;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const CATALOG_URL: &str =
    "https://www.binance.com/bapi/composite/v1/public/cms/article/catalog/list/query";
const LISTING_CATALOG_ID: u32 = 48;

pub struct BinanceSource {
    name: String,
    limit: usize,
    http: reqwest::Client,
}

impl BinanceSource {
    pub fn new(name: String, limit: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("crypto-news-bot/0.1")
            .build()?;
        Ok(Self { name, limit, http })
    }
}

#[async_trait]
impl NewsSource for BinanceSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawNewsItem>> {
        let payload = serde_json::json!({
            "type": "catalogs",
            "catalogId": LISTING_CATALOG_ID,
            "pageNo": 1,
            "pageSize": self.limit,
        });
        let body = self
            .http
            .post(CATALOG_URL)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_catalog(&body, self.limit)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    data: Option<CatalogData>,
}

/// The API has returned both shapes over time, so accept either a flat
/// article list or a list of catalogs with nested articles.
#[derive(Debug, Deserialize)]
struct CatalogData {
    #[serde(default)]
    articles: Vec<Article>,
    #[serde(default)]
    catalogs: Vec<Catalog>,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    id: Option<u64>,
    code: Option<String>,
    title: String,
    release_date: Option<i64>,
}

fn parse_catalog(body: &str, limit: usize) -> Result<Vec<RawNewsItem>> {
    let resp: CatalogResponse = serde_json::from_str(body)?;
    let data = resp
        .data
        .ok_or_else(|| BotError::Api("binance catalog response has no data".into()))?;

    let articles: Vec<Article> = if !data.articles.is_empty() {
        data.articles
    } else {
        data.catalogs.into_iter().flat_map(|c| c.articles).collect()
    };

    let mut items = Vec::new();
    for article in articles.into_iter().take(limit) {
        if article.title.trim().is_empty() {
            continue;
        }
        let guid = article
            .code
            .filter(|c| !c.is_empty())
            .or_else(|| article.id.map(|id| format!("binance-{id}")));
        let published = article
            .release_date
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        items.push(RawNewsItem {
            guid,
            link: None,
            title: article.title.trim().to_string(),
            published,
        });
    }
    Ok(items)
}
