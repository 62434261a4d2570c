//! Upstream event feed abstraction.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Event;

/// A feed of recent events, newest first.
///
/// Delivery is at-least-once: consecutive calls usually overlap, and the
/// ingestion tick relies on [`EventStore::insert_if_absent`] to absorb the
/// repeats.
///
/// [`EventStore::insert_if_absent`]: crate::store::EventStore::insert_if_absent
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Fetch one page of the most recent events.
    ///
    /// Records that cannot be decoded individually are dropped by the
    /// implementation; only transport-level or whole-response failures are
    /// returned as errors.
    async fn fetch_recent(&self, page_size: u32) -> Result<Vec<Event>>;
}
