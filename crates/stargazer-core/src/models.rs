//! Core data models shared by ingestion, ranking, and reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single event observed on the upstream feed.
///
/// `id` is the natural key: the store keeps at most one row per id no matter
/// how many times the feed repeats it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    /// Upstream type tag, e.g. `WatchEvent`.
    pub kind: String,
    /// Grouping key (`owner/name` for GitHub repositories).
    pub subject: String,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// Number of matching events for one subject inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCount {
    pub subject: String,
    pub count: i64,
}

impl SubjectCount {
    pub fn new(subject: impl Into<String>, count: i64) -> Self {
        Self {
            subject: subject.into(),
            count,
        }
    }
}

/// One row of the trending report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub subject: String,
    /// 1-based position in the current window.
    pub current_rank: i64,
    /// Position in the comparison window, if the subject ranked there.
    pub previous_rank: Option<i64>,
    /// `previous_rank (or limit + 1) - current_rank`. Positive means the
    /// subject climbed.
    pub rank_change: i64,
    /// Matching events for the subject in the current window.
    pub watch_count: i64,
}
