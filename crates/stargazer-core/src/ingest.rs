//! One ingestion tick: fetch a page, keep the configured event type, and
//! write each kept event with insert-if-absent semantics.
//!
//! The timer that drives ticks lives in the application crate; this module
//! only knows how to run a single tick against a source and a store.

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::Event;
use crate::source::EventSource;
use crate::store::EventStore;

/// Parameters for a single tick.
#[derive(Debug, Clone)]
pub struct IngestParams {
    /// Events requested from the source per tick.
    pub page_size: u32,
    /// Only events whose type tag equals this value are stored.
    pub event_type: String,
}

impl Default for IngestParams {
    fn default() -> Self {
        Self {
            page_size: 100,
            event_type: "WatchEvent".to_string(),
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Events returned by the source.
    pub fetched: usize,
    /// Events that matched the type filter.
    pub matched: usize,
    /// Newly written rows.
    pub inserted: usize,
    /// Matching events whose id was already stored.
    pub duplicates: usize,
    /// Matching events the store failed to write.
    pub failed: usize,
}

/// Fetch one page from `source` and store the matching events.
///
/// A fetch failure is returned to the caller, which is expected to log it and
/// wait for the next tick. Per-record write failures are logged and counted
/// in [`TickReport::failed`]; they never abort the page.
pub async fn run_tick<Src, St>(source: &Src, store: &St, params: &IngestParams) -> Result<TickReport>
where
    Src: EventSource + ?Sized,
    St: EventStore + ?Sized,
{
    let events = source.fetch_recent(params.page_size).await?;
    Ok(store_page(store, &events, &params.event_type).await)
}

/// Write the events of `page` whose type equals `event_type`, in page order.
pub async fn store_page<St>(store: &St, page: &[Event], event_type: &str) -> TickReport
where
    St: EventStore + ?Sized,
{
    let mut report = TickReport {
        fetched: page.len(),
        ..TickReport::default()
    };

    for event in page.iter().filter(|e| e.kind == event_type) {
        report.matched += 1;
        match store.insert_if_absent(event).await {
            Ok(true) => {
                report.inserted += 1;
                debug!(id = %event.id, subject = %event.subject, "inserted event");
            }
            Ok(false) => report.duplicates += 1,
            Err(e) => {
                report.failed += 1;
                warn!(id = %event.id, error = %e, "failed to store event");
            }
        }
    }

    report
}
