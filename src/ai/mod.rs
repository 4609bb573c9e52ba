//! Asynchronous AI enrichment
//!
//! Runs after the rule engine has already produced a decision: the model
//! gets the headline plus fresh search context and returns structured
//! advice. Failures degrade to placeholder text, never to an error, so a
//! broken provider can't stall the pipeline.

pub mod search;

use crate::config::AiConfig;
use crate::error::{BotError, Result};
use crate::types::{MarketState, NewsItem, TradingSignal};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub use search::SearchClient;

/// Structured result of one enrichment call.
#[derive(Debug, Clone)]
pub struct AiAdvice {
    pub analysis: String,
    pub advice: String,
    pub coin: String,
    /// WAIT is the "no opinion" value and never overwrites the rule
    /// engine's signal on merge.
    pub signal: TradingSignal,
}

#[async_trait]
pub trait Advisor: Send + Sync {
    /// Produce advice for one item. Infallible by contract: provider
    /// errors are folded into placeholder advice.
    async fn advise(&self, item: &NewsItem, market: &MarketState) -> AiAdvice;
}

/// Round-robin API key rotation shared across concurrent callers.
pub struct KeyRing {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Every key once, starting at the rotation cursor. Each call to
    /// `rotation` advances the cursor so load spreads across keys.
    pub fn rotation(&self) -> impl Iterator<Item = &str> {
        let start = if self.keys.is_empty() {
            0
        } else {
            self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len()
        };
        (0..self.keys.len()).map(move |i| self.keys[(start + i) % self.keys.len()].as_str())
    }
}

/// Advisor backed by an Ollama-style generate endpoint.
pub struct AiAdvisor {
    http: reqwest::Client,
    config: AiConfig,
    keys: KeyRing,
    search: SearchClient,
}

impl AiAdvisor {
    pub fn new(config: AiConfig, search: SearchClient) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let keys = KeyRing::new(config.keys.clone());
        Ok(Self {
            http,
            config,
            keys,
            search,
        })
    }

    fn build_prompt(item: &NewsItem, market: &MarketState, context: &str) -> String {
        format!(
            r#"You are a crypto trading analyst. Analyze this news headline and give actionable advice.

Headline: {}
Source: {}
Detected asset: {}
Rule engine signal: {}
Market mood: {} (score {:.3})

{}

Respond with ONLY a JSON object in this exact format:
{{"context": "<one-paragraph background>", "advice": "<concrete action advice>", "coin": "<ticker symbol or empty>", "signal": "<one of STRONG_BUY, BUY, CAUTION, WAIT, SELL, STRONG_SELL, CAUTION_SELL, IGNORE>"}}"#,
            item.title,
            item.source,
            item.asset,
            item.trading_signal
                .map(|s| s.as_str())
                .unwrap_or("WAIT"),
            market.mood.as_str(),
            market.score,
            context,
        )
    }

    async fn call_model(&self, key: &str, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
        });

        let resp = self
            .http
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {key}"))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(BotError::Api(format!(
                "model endpoint returned {status}: {}",
                snippet(&text)
            )));
        }
        Ok(extract_completion(&text))
    }
}

#[async_trait]
impl Advisor for AiAdvisor {
    async fn advise(&self, item: &NewsItem, market: &MarketState) -> AiAdvice {
        let query = format!("{} {} crypto news", item.title, item.asset);
        let context = self.search.search(&query).await;
        let prompt = Self::build_prompt(item, market, &context);

        for key in self.keys.rotation() {
            match self.call_model(key, &prompt).await {
                Ok(completion) => return parse_advice(&completion),
                Err(e) => {
                    tracing::warn!("[AI] Key failed, rotating: {}", e);
                }
            }
        }

        tracing::error!("[AI] All {} keys exhausted for item {}", self.keys.len(), item.id);
        AiAdvice {
            analysis: "AI exhausted".to_string(),
            advice: "All keys failed.".to_string(),
            coin: String::new(),
            signal: TradingSignal::Wait,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// First 200 characters of an error body for logging. Counts chars, not
/// bytes, so multibyte content never splits mid-character.
fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

/// Pull the model text out of whichever envelope the endpoint used:
/// OpenAI-style chat choices, Ollama-style `response`, or the raw body.
fn extract_completion(body: &str) -> String {
    if let Ok(chat) = serde_json::from_str::<ChatResponse>(body) {
        if let Some(choice) = chat.choices.into_iter().next() {
            return choice.message.content;
        }
    }
    if let Ok(gen) = serde_json::from_str::<GenerateResponse>(body) {
        return gen.response;
    }
    body.to_string()
}

#[derive(Debug, Deserialize)]
struct AdvicePayload {
    #[serde(default)]
    context: String,
    #[serde(default)]
    advice: String,
    #[serde(default)]
    coin: String,
    #[serde(default)]
    signal: String,
}

/// Parse the model's JSON advice, tolerating markdown code fences. An
/// unknown or missing signal becomes WAIT so it never overrides the rule
/// engine; unparseable output is kept verbatim as analysis text.
pub fn parse_advice(completion: &str) -> AiAdvice {
    let cleaned = completion
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<AdvicePayload>(cleaned) {
        Ok(payload) => AiAdvice {
            analysis: payload.context,
            advice: payload.advice,
            coin: payload.coin,
            signal: TradingSignal::parse(&payload.signal).unwrap_or(TradingSignal::Wait),
        },
        Err(_) => AiAdvice {
            analysis: completion.trim().to_string(),
            advice: "Check context".to_string(),
            coin: String::new(),
            signal: TradingSignal::Wait,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_advice_plain_json() {
        let advice = parse_advice(
            r#"{"context":"ETF approved","advice":"Scale in","coin":"BTC","signal":"STRONG_BUY"}"#,
        );
        assert_eq!(advice.analysis, "ETF approved");
        assert_eq!(advice.coin, "BTC");
        assert_eq!(advice.signal, TradingSignal::StrongBuy);
    }

    #[test]
    fn test_parse_advice_strips_code_fences() {
        let advice = parse_advice(
            "```json\n{\"context\":\"c\",\"advice\":\"a\",\"coin\":\"ETH\",\"signal\":\"SELL\"}\n```",
        );
        assert_eq!(advice.signal, TradingSignal::Sell);
        assert_eq!(advice.coin, "ETH");
    }

    #[test]
    fn test_parse_advice_unknown_signal_is_wait() {
        let advice =
            parse_advice(r#"{"context":"c","advice":"a","coin":"","signal":"HODL"}"#);
        assert_eq!(advice.signal, TradingSignal::Wait);

        let advice = parse_advice(r#"{"context":"c","advice":"a"}"#);
        assert_eq!(advice.signal, TradingSignal::Wait);
    }

    #[test]
    fn test_parse_advice_garbage_kept_as_analysis() {
        let advice = parse_advice("I think the market looks shaky today.");
        assert_eq!(advice.analysis, "I think the market looks shaky today.");
        assert_eq!(advice.advice, "Check context");
        assert_eq!(advice.signal, TradingSignal::Wait);
    }

    #[test]
    fn test_extract_completion_envelopes() {
        let chat = r#"{"choices":[{"message":{"content":"inner"}}]}"#;
        assert_eq!(extract_completion(chat), "inner");

        let gen = r#"{"response":"generated"}"#;
        assert_eq!(extract_completion(gen), "generated");

        assert_eq!(extract_completion("raw text"), "raw text");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        // char 200 is multibyte; a byte slice at 200 would split it
        let body = format!("{}é and more", "x".repeat(199));
        let s = snippet(&body);
        assert_eq!(s.chars().count(), 200);
        assert!(s.ends_with('é'));

        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_keyring_rotates_start_position() {
        let ring = KeyRing::new(vec!["a".into(), "b".into(), "c".into()]);
        let first: Vec<_> = ring.rotation().collect();
        let second: Vec<_> = ring.rotation().collect();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(second, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_keyring_empty() {
        let ring = KeyRing::new(vec![]);
        assert!(ring.is_empty());
        assert_eq!(ring.rotation().count(), 0);
    }
}
