//! Time-gated cache in front of the ranking engine.
//!
//! The cache owns one immutable [`Snapshot`] behind an `RwLock<Option<Arc<_>>>`.
//! Readers clone the `Arc`; a recomputation builds a complete new snapshot
//! and swaps the pointer, so `entries` and `computed_at` are always observed
//! together. The lock is never held across the ranking query.
//!
//! Concurrent misses may each recompute. Whichever result carries the later
//! `computed_at` is kept.

use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::RankEntry;
use crate::rank::{rank, RankParams};
use crate::store::EventStore;

#[derive(Debug)]
struct Snapshot {
    entries: Arc<Vec<RankEntry>>,
    computed_at: DateTime<Utc>,
}

impl Snapshot {
    fn report(&self, stale: bool) -> Report {
        Report {
            entries: Arc::clone(&self.entries),
            computed_at: self.computed_at,
            stale,
        }
    }
}

/// A ranking as handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Arc<Vec<RankEntry>>,
    /// Reference instant the ranking was computed for.
    pub computed_at: DateTime<Utc>,
    /// Set when recomputation failed and an older ranking was served instead.
    pub stale: bool,
}

/// Ranking cache with a fixed freshness window.
pub struct ReportCache<S> {
    store: S,
    params: RankParams,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl<S: EventStore> ReportCache<S> {
    pub fn new(store: S, params: RankParams, ttl: Duration) -> Self {
        Self {
            store,
            params,
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    /// When the cached ranking was computed, if there is one.
    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.current().map(|s| s.computed_at)
    }

    /// Return the cached ranking if it is younger than the freshness window,
    /// otherwise recompute it for `now`.
    ///
    /// If recomputation fails and an older ranking exists, that ranking is
    /// returned with `stale = true` and kept for the next call to retry
    /// against. With nothing cached, the error is returned.
    pub async fn get(&self, now: DateTime<Utc>) -> Result<Report> {
        let cached = self.current();

        if let Some(snap) = &cached {
            if now - snap.computed_at < self.ttl {
                return Ok(snap.report(false));
            }
        }

        debug!(%now, "recomputing ranking");
        match rank(&self.store, now, &self.params).await {
            Ok(entries) => {
                let fresh = Arc::new(Snapshot {
                    entries: Arc::new(entries),
                    computed_at: now,
                });
                Ok(self.swap_in(fresh).report(false))
            }
            Err(e) => {
                // Re-read: a concurrent caller may have succeeded meanwhile.
                match self.current() {
                    Some(prev) => {
                        warn!(
                            error = %e,
                            computed_at = %prev.computed_at,
                            "ranking failed, serving previous result"
                        );
                        Ok(prev.report(true))
                    }
                    None => Err(e),
                }
            }
        }
    }

    // Snapshots are replaced whole; a poisoned lock still holds a complete one.
    fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `fresh` unless a newer snapshot is already in place; returns the
    /// snapshot that ends up installed.
    fn swap_in(&self, fresh: Arc<Snapshot>) -> Arc<Snapshot> {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(existing) if existing.computed_at > fresh.computed_at => Arc::clone(existing),
            _ => {
                *guard = Some(Arc::clone(&fresh));
                fresh
            }
        }
    }
}
