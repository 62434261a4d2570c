//! Database statistics.
//!
//! A quick summary of what has been ingested: total events, distinct
//! repositories, the time span covered, and how much of it falls inside the
//! current and comparison ranking windows. Used by `stargazer stats`.

use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::ceil_seconds;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(DISTINCT subject) AS subjects,
            MIN(created_at) AS oldest,
            MAX(created_at) AS newest
        FROM events
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let total: i64 = row.get("total");
    let subjects: i64 = row.get("subjects");
    let oldest: Option<i64> = row.get("oldest");
    let newest: Option<i64> = row.get("newest");

    let now = Utc::now();
    let window = config.report.rank_params().window;
    let current_start = ceil_seconds(now - window);
    let previous_start = ceil_seconds(now - window - window);

    let current: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events WHERE created_at >= ? AND created_at < ?",
    )
    .bind(current_start)
    .bind(ceil_seconds(now))
    .fetch_one(&pool)
    .await?;

    let previous: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events WHERE created_at >= ? AND created_at < ?",
    )
    .bind(previous_start)
    .bind(current_start)
    .fetch_one(&pool)
    .await?;

    println!("Stargazer Database Stats");
    println!("==========================");
    println!();
    println!("  Database:      {}", config.database.dsn);
    println!("  Events:        {}", total);
    println!("  Repositories:  {}", subjects);
    println!(
        "  Oldest event:  {}",
        oldest.map(format_ts).unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Newest event:  {}",
        newest.map(format_ts).unwrap_or_else(|| "-".to_string())
    );
    println!();
    println!(
        "  Last {}h:      {}",
        config.report.window_hours, current
    );
    println!(
        "  Previous {}h:  {}",
        config.report.window_hours, previous
    );
    println!();

    pool.close().await;
    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
