//! Configuration management

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Seconds between collection cycles
    pub cycle_interval_secs: u64,
    /// In-memory item cap
    pub max_items: usize,
    /// Seen-id set cap before rebuild
    pub max_seen_ids: usize,
    /// Headlines taken per source per cycle
    pub per_source_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    /// Feed URL; not used by the binance kind
    pub url: Option<String>,
    #[serde(default)]
    pub kind: FeedKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Rss,
    Binance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Read API bind address
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Generate endpoint URL (Ollama-compatible)
    pub base_url: String,
    pub model: String,
    /// API keys, rotated round-robin
    #[serde(default)]
    pub keys: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    #[serde(default)]
    pub keys: Vec<String>,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration: optional config file, then NEWSBOT_* environment
    /// variables, then the key-list env vars used in deployment.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let expanded = shellexpand::tilde(
            path.as_ref()
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("non-utf8 config path"))?,
        );

        let settings = config::Config::builder()
            .add_source(config::File::with_name(expanded.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("NEWSBOT").separator("__"))
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        // Comma-separated key lists come from the environment so they stay
        // out of the config file.
        if let Ok(keys) = std::env::var("AI_KEYS") {
            config.ai.keys = split_keys(&keys);
        }
        if let Ok(keys) = std::env::var("SERPER_KEYS") {
            config.search.keys = split_keys(&keys);
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            feeds: default_feeds(),
            ai: AiConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "Binance Announcements".to_string(),
            url: None,
            kind: FeedKind::Binance,
        },
        FeedConfig {
            name: "CoinDesk".to_string(),
            url: Some("https://www.coindesk.com/arc/outboundfeeds/rss/".to_string()),
            kind: FeedKind::Rss,
        },
        FeedConfig {
            name: "CoinTelegraph".to_string(),
            url: Some("https://cointelegraph.com/rss".to_string()),
            kind: FeedKind::Rss,
        },
        FeedConfig {
            name: "Decrypt".to_string(),
            url: Some("https://decrypt.co/feed".to_string()),
            kind: FeedKind::Rss,
        },
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 10,
            max_items: 100,
            max_seen_ids: 5000,
            per_source_limit: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "news.db".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8081".to_string(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ollama.com/api/generate".to_string(),
            model: "qwen3-coder:480b-cloud".to_string(),
            keys: Vec::new(),
            timeout_secs: 15,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://google.serper.dev/search".to_string(),
            keys: Vec::new(),
            timeout_secs: 5,
        }
    }
}
