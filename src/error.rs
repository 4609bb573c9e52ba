//! Error types for the news engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
