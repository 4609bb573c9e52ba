//! Core data model: news items, scopes, trading signals, market state.
//!
//! JSON field names match the wire format the dashboard already consumes
//! (`ID`, `Title`, `AIAnalysis`, ...), so the serde attributes here are part
//! of the public contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Whether an item concerns the whole market or a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Market,
    Asset,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Asset => "ASSET",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "MARKET" => Some(Self::Market),
            "ASSET" => Some(Self::Asset),
            _ => None,
        }
    }
}

/// Final recommendation attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingSignal {
    Ignore,
    Wait,
    Caution,
    CautionSell,
    Buy,
    StrongBuy,
    Sell,
    StrongSell,
}

impl TradingSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "IGNORE",
            Self::Wait => "WAIT",
            Self::Caution => "CAUTION",
            Self::CautionSell => "CAUTION_SELL",
            Self::Buy => "BUY",
            Self::StrongBuy => "STRONG_BUY",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG_SELL",
        }
    }

    /// Parse a signal name as emitted by the rule engine or an AI reply.
    /// Unknown or empty strings yield `None`, never a default signal.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "IGNORE" => Some(Self::Ignore),
            "WAIT" => Some(Self::Wait),
            "CAUTION" => Some(Self::Caution),
            "CAUTION_SELL" => Some(Self::CautionSell),
            "BUY" => Some(Self::Buy),
            "STRONG_BUY" => Some(Self::StrongBuy),
            "SELL" => Some(Self::Sell),
            "STRONG_SELL" => Some(Self::StrongSell),
            _ => None,
        }
    }
}

/// Aggregated directional bias of the market for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketMood {
    Bullish,
    Neutral,
    Bearish,
}

impl MarketMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Neutral => "NEUTRAL",
            Self::Bearish => "BEARISH",
        }
    }
}

/// Global market mood, recomputed from each cycle's MARKET-scope items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketState {
    pub mood: MarketMood,
    pub score: f64,
}

impl Default for MarketState {
    fn default() -> Self {
        Self {
            mood: MarketMood::Neutral,
            score: 0.0,
        }
    }
}

/// A normalized, progressively-enriched news fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewsItem {
    #[serde(rename = "ID")]
    pub id: String,
    pub title: String,
    pub source: String,
    pub scope: Scope,
    pub asset: String,
    pub impact: f64,
    pub sentiment: f64,
    pub timestamp: DateTime<Utc>,

    // Decision fields, set by the rule engine (ASSET scope only).
    // On the wire an absent signal is the empty string, never null; the
    // dashboard string-matches this field.
    #[serde(with = "signal_wire")]
    pub trading_signal: Option<TradingSignal>,
    pub rule_reason: String,
    pub final_score: f64,

    // Enrichment fields, set asynchronously by the AI advisor
    #[serde(rename = "AIAnalysis")]
    pub ai_analysis: String,
    #[serde(rename = "AIAdvice")]
    pub ai_advice: String,
    pub coin_symbol: String,
}

impl NewsItem {
    /// Create an unclassified item with baseline values.
    pub fn new(id: String, title: String, source: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            source,
            scope: Scope::Asset,
            asset: "ALT".to_string(),
            impact: 0.3,
            sentiment: 0.0,
            timestamp,
            trading_signal: None,
            rule_reason: String::new(),
            final_score: 0.0,
            ai_analysis: String::new(),
            ai_advice: String::new(),
            coin_symbol: String::new(),
        }
    }
}

/// Raw item as produced by a source adapter, before identity resolution
/// and classification.
#[derive(Debug, Clone)]
pub struct RawNewsItem {
    /// Source-provided GUID, if any.
    pub guid: Option<String>,
    /// Canonical link, used as the id fallback.
    pub link: Option<String>,
    pub title: String,
    /// Publish time; fetch time is substituted when absent.
    pub published: Option<DateTime<Utc>>,
}

impl RawNewsItem {
    /// Resolve a stable id and build an unclassified [`NewsItem`].
    ///
    /// Identity falls back GUID -> link -> source-prefixed title hash, so an
    /// item keeps the same id across refetches even when the feed omits both
    /// identifiers.
    pub fn into_item(self, source: &str) -> NewsItem {
        let id = self
            .guid
            .filter(|g| !g.is_empty())
            .or_else(|| self.link.filter(|l| !l.is_empty()))
            .unwrap_or_else(|| title_hash_id(source, &self.title));
        let timestamp = self.published.unwrap_or_else(Utc::now);
        NewsItem::new(id, self.title, source.to_string(), timestamp)
    }
}

/// Wire codec for the optional trading signal: `None` is the empty
/// string. Tolerates null on input for pre-existing data.
mod signal_wire {
    use super::TradingSignal;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(signal: &Option<TradingSignal>, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ser.serialize_str(signal.map(|s| s.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Option<TradingSignal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(de)?.unwrap_or_default();
        Ok(TradingSignal::parse(&raw))
    }
}

/// Fallback id: lowercased source name plus a truncated SHA-256 of the title.
fn title_hash_id(source: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    let digest = hex::encode(hasher.finalize());
    let slug: String = source
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("{}-{}", slug, &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_roundtrip() {
        for signal in [
            TradingSignal::Ignore,
            TradingSignal::Wait,
            TradingSignal::Caution,
            TradingSignal::CautionSell,
            TradingSignal::Buy,
            TradingSignal::StrongBuy,
            TradingSignal::Sell,
            TradingSignal::StrongSell,
        ] {
            assert_eq!(TradingSignal::parse(signal.as_str()), Some(signal));
        }
    }

    #[test]
    fn test_signal_parse_rejects_unknown() {
        assert_eq!(TradingSignal::parse(""), None);
        assert_eq!(TradingSignal::parse("HOLD"), None);
        assert_eq!(TradingSignal::parse("buy"), None);
    }

    #[test]
    fn test_id_fallback_order() {
        let raw = RawNewsItem {
            guid: Some("guid-1".into()),
            link: Some("https://example.com/a".into()),
            title: "BTC rally".into(),
            published: None,
        };
        assert_eq!(raw.into_item("CoinDesk").id, "guid-1");

        let raw = RawNewsItem {
            guid: Some(String::new()),
            link: Some("https://example.com/a".into()),
            title: "BTC rally".into(),
            published: None,
        };
        assert_eq!(raw.into_item("CoinDesk").id, "https://example.com/a");
    }

    #[test]
    fn test_id_hash_is_stable_and_source_prefixed() {
        let make = || RawNewsItem {
            guid: None,
            link: None,
            title: "Notice on New Listing".into(),
            published: None,
        };
        let a = make().into_item("Binance Announcements");
        let b = make().into_item("Binance Announcements");
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("binance-announcements-"));
    }

    #[test]
    fn test_wire_field_names() {
        let item = NewsItem::new(
            "id-1".into(),
            "title".into(),
            "CoinDesk".into(),
            Utc::now(),
        );
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"ID\":\"id-1\""));
        assert!(json.contains("\"Scope\":\"ASSET\""));
        assert!(json.contains("\"AIAnalysis\""));
        assert!(json.contains("\"FinalScore\""));
        // absent signal is the empty string on the wire, never null
        assert!(json.contains("\"TradingSignal\":\"\""));
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_signal_wire_roundtrip() {
        let mut item = NewsItem::new("id-1".into(), "t".into(), "CoinDesk".into(), Utc::now());
        item.trading_signal = Some(TradingSignal::StrongBuy);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"TradingSignal\":\"STRONG_BUY\""));

        let back: NewsItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trading_signal, Some(TradingSignal::StrongBuy));

        // empty string and legacy null both read back as no signal
        let no_signal: NewsItem = serde_json::from_str(
            &json.replace("\"STRONG_BUY\"", "\"\""),
        )
        .unwrap();
        assert_eq!(no_signal.trading_signal, None);
        let legacy: NewsItem =
            serde_json::from_str(&json.replace("\"STRONG_BUY\"", "null")).unwrap();
        assert_eq!(legacy.trading_signal, None);
    }
}
