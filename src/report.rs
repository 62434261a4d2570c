//! `stargazer report`: compute the ranking once and print it.

use anyhow::Result;
use chrono::Utc;

use stargazer_core::rank::rank;

use crate::config::{Config, MAX_LIMIT};
use crate::db;
use crate::migrate;
use crate::render::render_text;
use crate::sqlite_store::SqliteEventStore;

pub async fn run_report(config: &Config, limit: Option<i64>) -> Result<()> {
    let mut params = config.report.rank_params();
    if let Some(limit) = limit {
        if !(1..=MAX_LIMIT).contains(&limit) {
            anyhow::bail!("--limit must be in [1, {}]", MAX_LIMIT);
        }
        params.limit = limit;
    }

    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    let store = SqliteEventStore::new(pool.clone());

    let entries = rank(&store, Utc::now(), &params).await?;

    if entries.is_empty() {
        println!(
            "No {} events in the last {} hours.",
            config.ingest.event_type, config.report.window_hours
        );
    } else {
        print!("{}", render_text(&entries));
    }

    pool.close().await;
    Ok(())
}
