//! Durable news storage
//!
//! SQLite-backed history of every item that ever entered the pipeline.
//! The in-memory store is bounded; this table is not. On conflicting id
//! the identity and classification columns keep their first-written
//! values and only the decision/enrichment columns update, so re-running
//! enrichment can never rewrite what a headline originally said.

use crate::types::{NewsItem, Scope, TradingSignal};
use crate::error::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite (creates the file if needed). Pass `:memory:`
    /// for an ephemeral database in tests.
    pub async fn connect(path: &str) -> Result<Self> {
        // In-memory SQLite is per-connection, so the pool must not grow
        // past one connection or queries would see different databases.
        let (db_url, max_connections) = if path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite:{path}?mode=rwc"), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news_items (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                scope TEXT NOT NULL,
                asset TEXT NOT NULL,
                impact REAL NOT NULL,
                sentiment REAL NOT NULL,
                timestamp TEXT NOT NULL,
                trading_signal TEXT NOT NULL DEFAULT '',
                rule_reason TEXT NOT NULL DEFAULT '',
                final_score REAL NOT NULL DEFAULT 0,
                ai_analysis TEXT NOT NULL DEFAULT '',
                ai_advice TEXT NOT NULL DEFAULT '',
                coin_symbol TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert an item, or refresh only its mutable columns when the id
    /// already exists.
    pub async fn upsert(&self, item: &NewsItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO news_items
                (id, title, source, scope, asset, impact, sentiment, timestamp,
                 trading_signal, rule_reason, final_score, ai_analysis, ai_advice, coin_symbol)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                trading_signal = excluded.trading_signal,
                final_score = excluded.final_score,
                ai_analysis = excluded.ai_analysis,
                ai_advice = excluded.ai_advice,
                coin_symbol = excluded.coin_symbol
            "#,
        )
        .bind(&item.id)
        .bind(&item.title)
        .bind(&item.source)
        .bind(item.scope.as_str())
        .bind(&item.asset)
        .bind(item.impact)
        .bind(item.sentiment)
        .bind(item.timestamp.to_rfc3339())
        .bind(item.trading_signal.map(|s| s.as_str()).unwrap_or(""))
        .bind(&item.rule_reason)
        .bind(item.final_score)
        .bind(&item.ai_analysis)
        .bind(&item.ai_advice)
        .bind(&item.coin_symbol)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent items, newest first. Used to rehydrate the in-memory
    /// store on startup.
    pub async fn load_recent(&self, limit: i64) -> Result<Vec<NewsItem>> {
        let rows = sqlx::query_as::<_, NewsItemRow>(
            r#"
            SELECT id, title, source, scope, asset, impact, sentiment, timestamp,
                   trading_signal, rule_reason, final_score, ai_analysis, ai_advice, coin_symbol
            FROM news_items
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(|r| r.try_into().ok()).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NewsItemRow {
    id: String,
    title: String,
    source: String,
    scope: String,
    asset: String,
    impact: f64,
    sentiment: f64,
    timestamp: String,
    trading_signal: String,
    rule_reason: String,
    final_score: f64,
    ai_analysis: String,
    ai_advice: String,
    coin_symbol: String,
}

impl TryFrom<NewsItemRow> for NewsItem {
    type Error = anyhow::Error;

    fn try_from(row: NewsItemRow) -> std::result::Result<Self, Self::Error> {
        Ok(NewsItem {
            id: row.id,
            title: row.title,
            source: row.source,
            scope: Scope::parse(&row.scope).unwrap_or(Scope::Asset),
            asset: row.asset,
            impact: row.impact,
            sentiment: row.sentiment,
            timestamp: row.timestamp.parse()?,
            trading_signal: TradingSignal::parse(&row.trading_signal),
            rule_reason: row.rule_reason,
            final_score: row.final_score,
            ai_analysis: row.ai_analysis,
            ai_advice: row.ai_advice,
            coin_symbol: row.coin_symbol,
        })
    }
}
