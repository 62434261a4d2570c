//! Storage abstraction for Stargazer.
//!
//! The [`EventStore`] trait is the only way the ingestion tick writes and the
//! ranking engine reads, so neither depends on a particular database engine
//! or its upsert dialect.
//!
//! Implementations must be `Send + Sync`: the ingestion task writes while
//! request handlers read.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Event, SubjectCount};

/// Durable, deduplicated event storage.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_if_absent`](EventStore::insert_if_absent) | Idempotent write keyed by event id |
/// | [`query_counts`](EventStore::query_counts) | Per-subject counts inside a half-open window |
/// | [`count_events`](EventStore::count_events) | Total stored rows |
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert `event` unless a row with the same id already exists.
    ///
    /// Returns `true` when a row was written and `false` when the id was
    /// already present. A duplicate is not an error.
    async fn insert_if_absent(&self, event: &Event) -> Result<bool>;

    /// Count events per subject with `start <= created_at < end`.
    ///
    /// Rows are ordered by count descending, then subject ascending, and
    /// truncated to `limit`.
    async fn query_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubjectCount>>;

    /// Total number of stored events.
    async fn count_events(&self) -> Result<i64>;
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for std::sync::Arc<S> {
    async fn insert_if_absent(&self, event: &Event) -> Result<bool> {
        (**self).insert_if_absent(event).await
    }

    async fn query_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubjectCount>> {
        (**self).query_counts(start, end, limit).await
    }

    async fn count_events(&self) -> Result<i64> {
        (**self).count_events().await
    }
}
