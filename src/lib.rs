//! Crypto News Intelligence Engine
//!
//! Ingests crypto news from external feeds on a fixed cycle, classifies each
//! item with rule-based heuristics, derives a market-wide mood, attaches a
//! context-aware trading signal, and asynchronously enriches items with an
//! AI opinion that may override the rule-based signal.

pub mod ai;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod market;
pub mod rules;
pub mod scorer;
pub mod server;
pub mod sources;
pub mod storage;
pub mod store;
pub mod types;
