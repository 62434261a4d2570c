//! In-memory [`EventStore`] for tests and ephemeral runs.
//!
//! Events live in a `HashMap` keyed by id behind a `std::sync::RwLock`.
//! Window counts are computed by a full scan.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Event, SubjectCount};
use crate::rank::sort_counts;

use super::EventStore;

/// Event store backed by process memory.
pub struct InMemoryEventStore {
    events: RwLock<HashMap<String, Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored events, without going through the async trait.
    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a stored event by id.
    pub fn get(&self, id: &str) -> Option<Event> {
        self.events.read().ok()?.get(id).cloned()
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert_if_absent(&self, event: &Event) -> Result<bool> {
        let mut events = self
            .events
            .write()
            .map_err(|_| anyhow!("event store lock poisoned"))?;
        if events.contains_key(&event.id) {
            return Ok(false);
        }
        events.insert(event.id.clone(), event.clone());
        Ok(true)
    }

    async fn query_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubjectCount>> {
        let events = self
            .events
            .read()
            .map_err(|_| anyhow!("event store lock poisoned"))?;

        let mut grouped: BTreeMap<&str, i64> = BTreeMap::new();
        for ev in events.values() {
            if ev.created_at >= start && ev.created_at < end {
                *grouped.entry(ev.subject.as_str()).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<SubjectCount> = grouped
            .into_iter()
            .map(|(subject, count)| SubjectCount::new(subject, count))
            .collect();
        sort_counts(&mut counts);
        counts.truncate(limit.max(0) as usize);
        Ok(counts)
    }

    async fn count_events(&self) -> Result<i64> {
        let events = self
            .events
            .read()
            .map_err(|_| anyhow!("event store lock poisoned"))?;
        Ok(events.len() as i64)
    }
}
