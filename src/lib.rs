//! # Stargazer
//!
//! Polls GitHub's public event feed for stars (`WatchEvent`s), stores them
//! once per event id, and serves a ranking of the most-starred repositories
//! over the last day, with each repository's movement against the day before.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ GitHub feed  │──▶│ Ingest loop  │──▶│  SQLite  │
//! │  /events     │   │ filter+dedup │   │  events  │
//! └──────────────┘   └──────────────┘   └────┬─────┘
//!                                            │
//!                                     ┌──────▼──────┐   ┌──────────┐
//!                                     │ Rank + cache│──▶│   HTTP   │
//!                                     └─────────────┘   └──────────┘
//! ```
//!
//! The ingest loop and the HTTP handlers never talk to each other directly;
//! the database is the only thing they share.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite event store |
//! | [`github`] | GitHub events source |
//! | [`ingest`] | Background ingestion loop |
//! | [`render`] | HTML and text rendering |
//! | [`server`] | HTTP server |
//! | [`report`] | One-shot ranking on the command line |
//! | [`stats`] | Database statistics |
//!
//! Storage-agnostic logic (models, traits, ranking, cache) lives in the
//! `stargazer-core` crate.

pub mod config;
pub mod db;
pub mod github;
pub mod ingest;
pub mod migrate;
pub mod render;
pub mod report;
pub mod server;
pub mod sqlite_store;
pub mod stats;
