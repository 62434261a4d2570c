//! Trending report HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | HTML trending table |
//! | `GET`  | `/api/trending` | Same report as JSON |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Every request asks the [`ReportCache`] for a ranking; the ranking query
//! only runs when the cached one has expired.
//!
//! # Error Contract
//!
//! `GET /` answers failures with status 500 and the error text as a plain
//! body. `GET /api/trending` answers with
//!
//! ```json
//! { "error": { "code": "internal", "message": "..." } }
//! ```

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use stargazer_core::cache::{Report, ReportCache};
use stargazer_core::source::EventSource;
use stargazer_core::store::EventStore;

use crate::config::Config;
use crate::db;
use crate::github::GithubEventSource;
use crate::ingest;
use crate::migrate;
use crate::render;
use crate::sqlite_store::SqliteEventStore;

/// Cache type shared by all handlers.
pub type SharedCache = ReportCache<Arc<dyn EventStore>>;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    cache: Arc<SharedCache>,
}

impl AppState {
    /// Build state with a fresh, empty cache over `store`.
    pub fn new(config: Config, store: Arc<dyn EventStore>) -> Self {
        let cache = ReportCache::new(
            store,
            config.report.rank_params(),
            config.report.cache_ttl(),
        );
        Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/api/trending", get(handle_trending))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "report server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("report server stopped");
    Ok(())
}

/// Starts ingestion and the report server, and runs until Ctrl-C or SIGTERM.
///
/// This is the entry point used by `stargazer serve`. The ingestion task and
/// the request handlers share nothing but the database.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let store: Arc<dyn EventStore> = Arc::new(SqliteEventStore::new(pool.clone()));
    let source: Arc<dyn EventSource> = Arc::new(GithubEventSource::new(&config.github)?);
    if config.github.token.is_none() {
        warn!("no GitHub token configured, requests are unauthenticated and heavily rate limited");
    }

    let listener = TcpListener::bind(config.addr()).await?;
    let (stop_tx, stop_rx) = watch::channel(false);

    let ingest_task = tokio::spawn(ingest::run_loop(
        source,
        Arc::clone(&store),
        config.ingest.params(),
        config.ingest.interval(),
        wait_for_stop(stop_rx.clone()),
    ));

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let state = AppState::new(config.clone(), store);
    serve(listener, state, wait_for_stop(stop_rx)).await?;

    ingest_task.await?;
    pool.close().await;
    Ok(())
}

async fn wait_for_stop(mut rx: watch::Receiver<bool>) {
    // Resolves on the first send, or when the sender is dropped.
    let _ = rx.changed().await;
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
    json: bool,
}

impl AppError {
    /// 500 with the error chain as a plain-text body.
    fn text(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{:#}", err),
            json: false,
        }
    }

    /// 500 with a JSON error body.
    fn json(err: anyhow::Error) -> Self {
        Self {
            json: true,
            ..Self::text(err)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status, error = %self.message, "request failed");
        if self.json {
            let body = ErrorBody {
                error: ErrorDetail {
                    code: "internal".to_string(),
                    message: self.message,
                },
            };
            (self.status, Json(body)).into_response()
        } else {
            (self.status, self.message).into_response()
        }
    }
}

// ============ GET / ============

async fn handle_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let report = state.cache.get(Utc::now()).await.map_err(AppError::text)?;
    let html = render::render_html(&report, state.config.report.window_hours)
        .map_err(AppError::text)?;
    Ok(Html(html))
}

// ============ GET /api/trending ============

async fn handle_trending(State(state): State<AppState>) -> Result<Json<Report>, AppError> {
    let report = state.cache.get(Utc::now()).await.map_err(AppError::json)?;
    Ok(Json(report))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
