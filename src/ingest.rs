//! Background ingestion loop.
//!
//! Drives [`stargazer_core::ingest::run_tick`] on a fixed interval until the
//! shutdown future resolves. A failed fetch is logged and the loop waits for
//! the next tick; the following fetch covers the same recent window, so
//! nothing is retried in between.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use stargazer_core::ingest::{run_tick, IngestParams, TickReport};
use stargazer_core::source::EventSource;
use stargazer_core::store::EventStore;

use crate::config::Config;
use crate::db;
use crate::github::GithubEventSource;
use crate::migrate;
use crate::sqlite_store::SqliteEventStore;

/// Run one tick and log its outcome. Never fails.
pub async fn tick_once(
    source: &dyn EventSource,
    store: &dyn EventStore,
    params: &IngestParams,
) -> Option<TickReport> {
    match run_tick(source, store, params).await {
        Ok(report) => {
            if report.inserted > 0 || report.failed > 0 {
                info!(
                    source = source.name(),
                    fetched = report.fetched,
                    matched = report.matched,
                    inserted = report.inserted,
                    duplicates = report.duplicates,
                    failed = report.failed,
                    "ingest tick"
                );
            } else {
                debug!(
                    source = source.name(),
                    fetched = report.fetched,
                    matched = report.matched,
                    duplicates = report.duplicates,
                    "ingest tick, nothing new"
                );
            }
            Some(report)
        }
        Err(e) => {
            warn!(source = source.name(), error = %e, "fetch failed, waiting for next tick");
            None
        }
    }
}

/// Tick every `interval` until `shutdown` resolves.
///
/// The first tick fires immediately. A tick that overruns the interval delays
/// the next one rather than bursting. A tick already in progress when
/// shutdown is requested runs to completion.
pub async fn run_loop<F>(
    source: Arc<dyn EventSource>,
    store: Arc<dyn EventStore>,
    params: IngestParams,
    interval: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(
        source = source.name(),
        interval_ms = interval.as_millis() as u64,
        event_type = %params.event_type,
        "ingestion started"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        tick_once(source.as_ref(), store.as_ref(), &params).await;
    }

    info!(source = source.name(), "ingestion stopped");
}

/// `stargazer poll`: ingest without serving. With `once`, run a single tick
/// and print its report.
pub async fn run_poll<F>(config: &Config, once: bool, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::new(pool.clone()));
    let source: Arc<dyn EventSource> = Arc::new(GithubEventSource::new(&config.github)?);
    let params = config.ingest.params();

    if once {
        match tick_once(source.as_ref(), store.as_ref(), &params).await {
            Some(report) => {
                println!("poll {}", source.name());
                println!("  fetched: {}", report.fetched);
                println!("  matched: {}", report.matched);
                println!("  inserted: {}", report.inserted);
                println!("  duplicates: {}", report.duplicates);
                println!("  failed: {}", report.failed);
            }
            None => println!("poll {}: fetch failed (see log)", source.name()),
        }
    } else {
        run_loop(source, store, params, config.ingest.interval(), shutdown).await;
    }

    pool.close().await;
    Ok(())
}
