//! Crypto News Intelligence Bot
//!
//! Collects crypto news, classifies it, derives trading signals, and
//! serves the results over a small read API.

use clap::{Parser, Subcommand};
use crypto_news_bot::{
    ai::{AiAdvisor, SearchClient},
    classifier,
    collector::Collector,
    config::{Config, FeedKind},
    market, rules, scorer,
    server::{create_app, AppState},
    sources::{BinanceSource, NewsSource, RssSource},
    storage::Database,
    store::NewsStore,
    types::{MarketState, NewsItem, Scope},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "crypto-news-bot")]
#[command(about = "Crypto news collection and trading signal engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collection loop and read API
    Run,
    /// Classify and score a single headline, without fetching anything
    Analyze {
        /// Headline text
        title: String,
    },
    /// Show recent items from the database
    Recent {
        /// Number of items to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run => run_bot(config).await,
        Commands::Analyze { title } => analyze_headline(&title),
        Commands::Recent { limit } => show_recent(config, limit).await,
    }
}

async fn run_bot(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting crypto news bot");

    let db = Arc::new(Database::connect(&config.database.path).await?);
    let store = Arc::new(RwLock::new(NewsStore::with_limits(
        config.engine.max_items,
        config.engine.max_seen_ids,
    )));

    // Rehydrate from the last run so restart does not re-announce old news
    let recent = db.load_recent(config.engine.max_items as i64).await?;
    if !recent.is_empty() {
        tracing::info!("Rehydrated {} items from database", recent.len());
        store.write().await.bootstrap(recent);
    }

    let sources = build_sources(&config)?;
    if config.ai.keys.is_empty() {
        tracing::warn!("No AI keys configured, enrichment will return placeholders");
    }

    let search = SearchClient::new(config.search.clone())?;
    let advisor = Arc::new(AiAdvisor::new(config.ai.clone(), search)?);

    let collector = Collector::new(
        config.engine.clone(),
        sources,
        Arc::clone(&store),
        Arc::clone(&db),
        advisor,
    );
    collector.start().await?;

    let app = create_app(AppState { store });
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!("Read API listening on {}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn NewsSource>>> {
    let limit = config.engine.per_source_limit;
    let mut sources: Vec<Arc<dyn NewsSource>> = Vec::new();

    for feed in &config.feeds {
        match feed.kind {
            FeedKind::Binance => {
                sources.push(Arc::new(BinanceSource::new(feed.name.clone(), limit)?));
            }
            FeedKind::Rss => {
                let url = feed
                    .url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("feed {} has no url", feed.name))?;
                sources.push(Arc::new(RssSource::new(feed.name.clone(), url, limit)?));
            }
        }
    }

    tracing::info!("Configured {} news sources", sources.len());
    Ok(sources)
}

fn analyze_headline(title: &str) -> anyhow::Result<()> {
    let mut item = NewsItem::new(
        "analyze".to_string(),
        title.to_string(),
        "manual".to_string(),
        chrono::Utc::now(),
    );
    classifier::classify(&mut item);

    if item.scope == Scope::Asset {
        // Judge against a neutral market since there is no cycle context
        rules::apply(&mut item, &MarketState::default());
        item.final_score = scorer::score(&item);
    }

    println!("\nHeadline: {title}\n");
    println!("Scope:     {}", item.scope.as_str());
    println!("Asset:     {}", item.asset);
    println!("Impact:    {:.2}", item.impact);
    println!("Sentiment: {:.2}", item.sentiment);

    match item.scope {
        Scope::Asset => {
            println!("Score:     {:.4}", item.final_score);
            println!(
                "Signal:    {} ({})",
                item.trading_signal.map(|s| s.as_str()).unwrap_or("-"),
                item.rule_reason
            );
        }
        Scope::Market => {
            let state = market::aggregate(std::slice::from_ref(&item));
            println!("Mood:      {} ({:.3})", state.mood.as_str(), state.score);
        }
    }

    Ok(())
}

async fn show_recent(config: Config, limit: i64) -> anyhow::Result<()> {
    let db = Database::connect(&config.database.path).await?;
    let items = db.load_recent(limit).await?;

    println!("\n{:<20} {:<6} {:<12} {:<50}", "Time", "Asset", "Signal", "Title");
    println!("{}", "-".repeat(90));

    for item in items {
        let title = if item.title.chars().count() > 47 {
            let truncated: String = item.title.chars().take(47).collect();
            format!("{truncated}...")
        } else {
            item.title.clone()
        };
        println!(
            "{:<20} {:<6} {:<12} {:<50}",
            item.timestamp.format("%Y-%m-%d %H:%M:%S"),
            item.asset,
            item.trading_signal.map(|s| s.as_str()).unwrap_or("-"),
            title
        );
    }

    Ok(())
}
