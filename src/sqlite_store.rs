//! SQLite-backed [`EventStore`] implementation.
//!
//! Timestamps are stored as whole Unix seconds. Window bounds are rounded up
//! to the next whole second, which keeps `start <= created_at < end` exact for
//! stored rows.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use stargazer_core::models::{Event, SubjectCount};
use stargazer_core::store::EventStore;

/// Unix seconds of `at`, rounded up when there is a fractional part.
pub(crate) fn ceil_seconds(at: DateTime<Utc>) -> i64 {
    let secs = at.timestamp();
    if at.timestamp_subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// SQLite implementation of the [`EventStore`] trait.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert_if_absent(&self, event: &Event) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (id, type, actor, subject, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&event.id)
        .bind(&event.kind)
        .bind(&event.actor)
        .bind(&event.subject)
        .bind(event.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<SubjectCount>> {
        let rows = sqlx::query(
            r#"
            SELECT subject, COUNT(*) AS watch_count
            FROM events
            WHERE created_at >= ? AND created_at < ?
            GROUP BY subject
            ORDER BY watch_count DESC, subject ASC
            LIMIT ?
            "#,
        )
        .bind(ceil_seconds(start))
        .bind(ceil_seconds(end))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SubjectCount {
                subject: row.get("subject"),
                count: row.get("watch_count"),
            })
            .collect())
    }

    async fn count_events(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
