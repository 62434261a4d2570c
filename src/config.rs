//! Configuration loading.
//!
//! Settings come from an optional TOML file, then environment overrides are
//! applied on top, then the result is validated. A missing file is not an
//! error: every field has a default so the binary can run from environment
//! variables alone. The binary loads a `.env` file into the environment
//! before any of this runs.
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `APP_ENV` | `app_env` (`development` or `production`) |
//! | `DATABASE__DSN`, `DATABASE_URL` | `database.dsn` |
//! | `GITHUB__TOKEN`, `GITHUB_TOKEN` | `github.token` |
//! | `PORT` | `server.port` |

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::Deserialize;
use std::path::Path;

use stargazer_core::ingest::IngestParams;
use stargazer_core::rank::RankParams;

/// Largest accepted `report.limit` (and `--limit`).
pub const MAX_LIMIT: i64 = 1000;

/// Largest accepted `report.window_hours`, about five years.
pub const MAX_WINDOW_HOURS: i64 = 24 * 365 * 5;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app_env: AppEnv,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for AppEnv {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => bail!(
                "Unknown app_env: '{}'. Must be development or production.",
                other
            ),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_dsn")]
    pub dsn: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { dsn: default_dsn() }
    }
}

fn default_dsn() -> String {
    "sqlite:./data/stargazer.sqlite".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    /// Personal access token. Unauthenticated requests work but are heavily
    /// rate limited.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    format!("stargazer/{}", env!("CARGO_PKG_VERSION"))
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_event_type")]
    pub event_type: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            page_size: default_page_size(),
            event_type: default_event_type(),
        }
    }
}

fn default_interval_ms() -> u64 {
    1500
}
fn default_page_size() -> u32 {
    100
}
fn default_event_type() -> String {
    "WatchEvent".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            limit: default_limit(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_window_hours() -> i64 {
    24
}
fn default_limit() -> i64 {
    100
}
fn default_cache_ttl_secs() -> i64 {
    3600
}

impl Config {
    /// Address the HTTP server binds to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_dev(&self) -> bool {
        self.app_env == AppEnv::Development
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Empty values are accepted; an empty token means "no token".
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k));

        if let Some(env) = first(&["APP_ENV"]) {
            self.app_env = env.parse()?;
        }
        if let Some(dsn) = first(&["DATABASE__DSN", "DATABASE_URL"]) {
            self.database.dsn = dsn;
        }
        if let Some(token) = first(&["GITHUB__TOKEN", "GITHUB_TOKEN"]) {
            self.github.token = Some(token);
        }
        if let Some(port) = first(&["PORT"]) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
        }

        if self.github.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.github.token = None;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.dsn.trim().is_empty() {
            bail!("database.dsn must not be empty");
        }
        if self.ingest.interval_ms == 0 {
            bail!("ingest.interval_ms must be > 0");
        }
        if self.ingest.page_size == 0 || self.ingest.page_size > 100 {
            bail!("ingest.page_size must be in [1, 100]");
        }
        if self.ingest.event_type.trim().is_empty() {
            bail!("ingest.event_type must not be empty");
        }
        if !(1..=MAX_WINDOW_HOURS).contains(&self.report.window_hours) {
            bail!("report.window_hours must be in [1, {}]", MAX_WINDOW_HOURS);
        }
        if !(1..=MAX_LIMIT).contains(&self.report.limit) {
            bail!("report.limit must be in [1, {}]", MAX_LIMIT);
        }
        if self.report.cache_ttl_secs < 0 {
            bail!("report.cache_ttl_secs must be >= 0");
        }
        if self.github.timeout_secs == 0 {
            bail!("github.timeout_secs must be > 0");
        }
        Ok(())
    }
}

impl IngestConfig {
    pub fn params(&self) -> IngestParams {
        IngestParams {
            page_size: self.page_size,
            event_type: self.event_type.clone(),
        }
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }
}

impl ReportConfig {
    pub fn rank_params(&self) -> RankParams {
        RankParams {
            window: Duration::hours(self.window_hours),
            limit: self.limit,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::seconds(self.cache_ttl_secs)
    }
}

/// Load configuration from `path` (if it exists) and the process environment.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert!(cfg.is_dev());
        assert_eq!(cfg.addr(), "0.0.0.0:8080");
        assert_eq!(cfg.ingest.interval_ms, 1500);
        assert_eq!(cfg.ingest.page_size, 100);
        assert_eq!(cfg.ingest.event_type, "WatchEvent");
        assert_eq!(cfg.report.limit, 100);
        assert_eq!(cfg.report.cache_ttl(), Duration::hours(1));
        cfg.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
app_env = "production"

[server]
port = 9000

[report]
limit = 25
"#,
        )
        .unwrap();

        assert_eq!(cfg.app_env, AppEnv::Production);
        assert_eq!(cfg.addr(), "0.0.0.0:9000");
        assert_eq!(cfg.report.limit, 25);
        assert_eq!(cfg.report.window_hours, 24);
        assert_eq!(cfg.report.rank_params().sentinel_rank(), 26);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "sqlite:/tmp/x.sqlite"),
            ("GITHUB_TOKEN", "ghp_abc"),
            ("PORT", "3000"),
        ]))
        .unwrap();

        assert_eq!(cfg.app_env, AppEnv::Production);
        assert_eq!(cfg.database.dsn, "sqlite:/tmp/x.sqlite");
        assert_eq!(cfg.github.token.as_deref(), Some("ghp_abc"));
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn test_double_underscore_keys_win() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[
            ("DATABASE__DSN", "sqlite:a.sqlite"),
            ("DATABASE_URL", "sqlite:b.sqlite"),
        ]))
        .unwrap();
        assert_eq!(cfg.database.dsn, "sqlite:a.sqlite");
    }

    #[test]
    fn test_empty_token_means_none() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[("GITHUB_TOKEN", "")])).unwrap();
        assert!(cfg.github.token.is_none());
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.apply_env(env(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_unknown_app_env_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.apply_env(env(&[("APP_ENV", "staging")])).is_err());
    }

    #[test]
    fn test_validation() {
        let mut cfg = Config::default();
        cfg.ingest.page_size = 101;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.report.limit = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.ingest.interval_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_limit_upper_bound() {
        let mut cfg = Config::default();
        cfg.report.limit = MAX_LIMIT;
        cfg.validate().unwrap();

        cfg.report.limit = MAX_LIMIT + 1;
        assert!(cfg.validate().is_err());

        cfg.report.limit = i64::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("report.limit"));
    }

    #[test]
    fn test_window_upper_bound() {
        let mut cfg = Config::default();
        cfg.report.window_hours = MAX_WINDOW_HOURS;
        cfg.validate().unwrap();
        let _ = cfg.report.rank_params();

        cfg.report.window_hours = MAX_WINDOW_HOURS + 1;
        assert!(cfg.validate().is_err());

        cfg.report.window_hours = i64::MAX;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("report.window_hours"));
    }
}
