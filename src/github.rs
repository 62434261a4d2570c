//! GitHub public events feed.
//!
//! Calls `GET {api_url}/events?per_page=N` once per tick. The feed is newest
//! first and overlaps heavily between calls; duplicates are absorbed by the
//! store.
//!
//! Decoding is per record: an entry without an id or with an unreadable
//! timestamp is dropped with a warning, and missing actor or repository
//! names become empty strings. The rest of the page is kept.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use stargazer_core::models::Event;
use stargazer_core::source::EventSource;

use crate::config::GithubConfig;

/// [`EventSource`] backed by the GitHub REST API.
pub struct GithubEventSource {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubEventSource {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl EventSource for GithubEventSource {
    fn name(&self) -> &str {
        "github"
    }

    async fn fetch_recent(&self, page_size: u32) -> Result<Vec<Event>> {
        let url = format!("{}/events", self.api_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[("per_page", page_size)])
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if let Some(remaining) = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
        {
            debug!(remaining, "github rate limit");
        }

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("GitHub API error {}: {}", status, body_text.trim());
        }

        let body = response.text().await?;
        decode_events(&body)
    }
}

#[derive(Deserialize)]
struct RawEvent {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    actor: Option<RawActor>,
    repo: Option<RawRepo>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawActor {
    login: Option<String>,
}

#[derive(Deserialize)]
struct RawRepo {
    name: Option<String>,
}

/// Decode a `/events` response body.
///
/// Fails only when the body is not a JSON array.
pub fn decode_events(body: &str) -> Result<Vec<Event>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).context("GitHub events response is not a JSON array")?;

    let mut events = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let raw: RawEvent = match serde_json::from_value(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(index, error = %e, "skipping undecodable event");
                continue;
            }
        };

        let (Some(id), Some(created_at)) = (raw.id, raw.created_at) else {
            warn!(index, "skipping event without id or created_at");
            continue;
        };

        events.push(Event {
            id,
            kind: raw.kind.unwrap_or_default(),
            subject: raw.repo.and_then(|r| r.name).unwrap_or_default(),
            actor: raw.actor.and_then(|a| a.login).unwrap_or_default(),
            created_at,
        });
    }

    Ok(events)
}
