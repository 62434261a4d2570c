//! # Stargazer Core
//!
//! Storage-agnostic logic for Stargazer: event models, the store and source
//! traits, a single ingestion tick, windowed ranking, and the report cache.
//!
//! This crate contains no tokio runtime, sqlx, or HTTP dependencies. The
//! application crate supplies the SQLite store, the GitHub source, and the
//! timer that drives ingestion.

pub mod cache;
pub mod ingest;
pub mod models;
pub mod rank;
pub mod source;
pub mod store;
