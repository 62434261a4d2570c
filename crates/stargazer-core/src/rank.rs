//! Windowed ranking with rank-change against the preceding window.
//!
//! # Algorithm
//!
//! 1. Count events per subject in the current window `[now - w, now)`.
//! 2. Count events per subject in the comparison window `[now - 2w, now - w)`.
//! 3. Order both by count (desc), subject (asc) and keep the top `limit`.
//! 4. Ranks are positions in that order, starting at 1.
//! 5. Left-join current onto comparison by subject:
//!    `rank_change = previous_rank.unwrap_or(limit + 1) - current_rank`.
//!
//! A subject that did not rank in the comparison window is treated as if it
//! stood just outside the cutoff, so new entrants show a large climb.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::models::{RankEntry, SubjectCount};
use crate::store::EventStore;

/// Ranking parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RankParams {
    /// Width of each window.
    pub window: Duration,
    /// Number of subjects kept per window.
    pub limit: i64,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            window: Duration::hours(24),
            limit: 100,
        }
    }
}

impl RankParams {
    /// Rank assigned to subjects absent from the comparison ranking when
    /// computing their change.
    pub fn sentinel_rank(&self) -> i64 {
        self.limit.saturating_add(1)
    }
}

/// Compute the ranking for the window ending at `now`.
///
/// Store failures are returned unchanged; nothing is cached here.
pub async fn rank<S>(store: &S, now: DateTime<Utc>, params: &RankParams) -> Result<Vec<RankEntry>>
where
    S: EventStore + ?Sized,
{
    let current_start = now - params.window;
    let previous_start = current_start - params.window;

    let current = store.query_counts(current_start, now, params.limit).await?;
    let previous = store
        .query_counts(previous_start, current_start, params.limit)
        .await?;

    Ok(merge_rankings(current, previous, params))
}

/// Order counts by count descending, then subject ascending.
pub fn sort_counts(counts: &mut [SubjectCount]) {
    counts.sort_by(compare_counts);
}

fn compare_counts(a: &SubjectCount, b: &SubjectCount) -> Ordering {
    b.count
        .cmp(&a.count)
        .then_with(|| a.subject.cmp(&b.subject))
}

/// Merge a current and a comparison ranking into report rows.
///
/// Inputs are re-sorted and truncated so the result does not depend on the
/// order the store returned them in.
pub fn merge_rankings(
    mut current: Vec<SubjectCount>,
    mut previous: Vec<SubjectCount>,
    params: &RankParams,
) -> Vec<RankEntry> {
    let limit = params.limit.max(0) as usize;
    sort_counts(&mut current);
    sort_counts(&mut previous);
    current.truncate(limit);
    previous.truncate(limit);

    let previous_ranks: HashMap<&str, i64> = previous
        .iter()
        .enumerate()
        .map(|(i, c)| (c.subject.as_str(), i as i64 + 1))
        .collect();

    let sentinel = params.sentinel_rank();

    current
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let current_rank = i as i64 + 1;
            let previous_rank = previous_ranks.get(c.subject.as_str()).copied();
            RankEntry {
                subject: c.subject.clone(),
                current_rank,
                previous_rank,
                rank_change: previous_rank.unwrap_or(sentinel) - current_rank,
                watch_count: c.count,
            }
        })
        .collect()
}
