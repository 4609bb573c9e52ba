//! RSS/Atom feed source

use super::NewsSource;
use crate::error::{BotError, Result};
use crate::types::RawNewsItem;
use async_trait::async_trait;
use std::time::Duration;

pub struct RssSource {
    name: String,
    url: String,
    limit: usize,
    http: reqwest::Client,
}

impl RssSource {
    pub fn new(name: String, url: String, limit: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("crypto-news-bot/0.1")
            .build()?;
        Ok(Self {
            name,
            url,
            limit,
            http,
        })
    }
}

#[async_trait]
impl NewsSource for RssSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawNewsItem>> {
        let body = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        entries_from(&body, self.limit)
    }
}

/// Parse a feed document into raw items, keeping the feed's own order
/// (newest first for every feed we consume).
fn entries_from(content: &[u8], limit: usize) -> Result<Vec<RawNewsItem>> {
    let feed = feed_rs::parser::parse(content)
        .map_err(|e| BotError::Feed(format!("feed parse failed: {e}")))?;

    let mut items = Vec::new();
    for entry in feed.entries.into_iter().take(limit) {
        let title = match entry.title {
            Some(t) if !t.content.trim().is_empty() => t.content.trim().to_string(),
            _ => continue,
        };
        let guid = if entry.id.trim().is_empty() {
            None
        } else {
            Some(entry.id)
        };
        let link = entry.links.first().map(|l| l.href.clone());
        items.push(RawNewsItem {
            guid,
            link,
            title,
            published: entry.published,
        });
    }
    Ok(items)
}
