//! Web search for enrichment context
//!
//! Pulls the last day's top results for a headline so the model judges
//! against something fresher than its training data. Like the advisor,
//! this never errors: every failure mode maps to a placeholder string.

use super::KeyRing;
use crate::config::SearchConfig;
use crate::error::{BotError, Result};
use serde::Deserialize;
use std::time::Duration;

const RESULT_LIMIT: u32 = 3;

pub struct SearchClient {
    http: reqwest::Client,
    endpoint: String,
    keys: KeyRing,
}

impl SearchClient {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
            keys: KeyRing::new(config.keys),
        })
    }

    /// Search and format results as a context block for the prompt.
    pub async fn search(&self, query: &str) -> String {
        if self.keys.is_empty() {
            return "Search API Unavailable.".to_string();
        }

        for key in self.keys.rotation() {
            match self.query_once(key, query).await {
                Ok(results) => return format_results(&results),
                Err(e) => {
                    tracing::warn!("[Search] Key failed, rotating: {}", e);
                }
            }
        }
        "Search API Unavailable.".to_string()
    }

    async fn query_once(&self, key: &str, query: &str) -> Result<Vec<OrganicResult>> {
        let payload = serde_json::json!({
            "q": query,
            "num": RESULT_LIMIT,
            "tbs": "qdr:d",
        });

        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", key)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BotError::Api(format!("search returned {status}")));
        }
        let body: SearchResponse = resp.json().await?;
        Ok(body.organic)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    #[serde(default)]
    snippet: String,
    date: Option<String>,
}

fn format_results(results: &[OrganicResult]) -> String {
    if results.is_empty() {
        return "No relevant search results found.".to_string();
    }
    let mut out = String::from("Search Results (Verification Context):\n");
    for r in results.iter().take(RESULT_LIMIT as usize) {
        out.push_str(&format!(
            "- {}: {} ({})\n",
            r.title,
            r.snippet,
            r.date.as_deref().unwrap_or("no date")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_results() {
        let results = vec![
            OrganicResult {
                title: "BTC ETF approved".into(),
                snippet: "The SEC approved...".into(),
                date: Some("2 hours ago".into()),
            },
            OrganicResult {
                title: "Markets react".into(),
                snippet: "Prices moved...".into(),
                date: None,
            },
        ];
        let text = format_results(&results);
        assert!(text.starts_with("Search Results (Verification Context):"));
        assert!(text.contains("- BTC ETF approved: The SEC approved... (2 hours ago)"));
        assert!(text.contains("(no date)"));
    }

    #[test]
    fn test_empty_results_placeholder() {
        assert_eq!(format_results(&[]), "No relevant search results found.");
    }

    #[tokio::test]
    async fn test_no_keys_is_unavailable() {
        let client = SearchClient::new(SearchConfig {
            endpoint: "https://google.serper.dev/search".into(),
            keys: vec![],
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.search("btc").await, "Search API Unavailable.");
    }
}
