// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the status surface.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::{self as axum_middleware, Next},
    response::Response,
    routing::get,
    Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use poller_config::PollerSection;
use poller_core::PollerError;
use poller_plugin::Catalog;

use crate::handlers;
use crate::runtime::{BuildInfo, MemoryStatsFn};

/// Request totals for the status surface.
///
/// Kept outside every plugin container so counting never takes a plugin lock.
#[derive(Debug, Default)]
pub struct RequestStats {
    requests: AtomicU64,
    missing: AtomicU64,
}

/// Point-in-time copy of [`RequestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub requests: u64,
    pub missing: u64,
}

impl RequestStats {
    pub fn record(&self, missing: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if missing {
            self.missing.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> RequestCounts {
        RequestCounts {
            requests: self.requests.load(Ordering::Relaxed),
            missing: self.missing.load(Ordering::Relaxed),
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct WebState {
    pub catalog: Arc<Catalog>,
    /// Resolved core section, echoed by `/api/v1/config`.
    pub poller: Arc<PollerSection>,
    pub build: Arc<BuildInfo>,
    /// Process start time for uptime calculation.
    pub start: Instant,
    /// Optional allocator statistics source.
    pub memory_stats: Option<MemoryStatsFn>,
    /// Directory holding `index.html` and `static/`.
    pub html_path: PathBuf,
    pub requests: Arc<RequestStats>,
}

impl WebState {
    pub fn new(catalog: Arc<Catalog>, poller: PollerSection) -> Self {
        Self {
            catalog,
            poller: Arc::new(poller),
            build: Arc::new(BuildInfo::default()),
            start: Instant::now(),
            memory_stats: None,
            html_path: PathBuf::from("."),
            requests: Arc::new(RequestStats::default()),
        }
    }

    pub fn with_build(mut self, build: BuildInfo) -> Self {
        self.build = Arc::new(build);
        self
    }

    pub fn with_start(mut self, start: Instant) -> Self {
        self.start = start;
        self
    }

    pub fn with_memory_stats(mut self, source: MemoryStatsFn) -> Self {
        self.memory_stats = Some(source);
        self
    }

    pub fn with_html_path(mut self, path: PathBuf) -> Self {
        self.html_path = path;
        self
    }
}

/// Build the full router.
///
/// Routes:
/// - `/` and `/health`
/// - `/css`, `/js`, `/images` (also `/img`, `/image`) from `<html_path>/static`
/// - `/api/v1/config`, `/api/v1/config/plugins`
/// - `/api/v1/output/{output}[/{sub}[/{value}]]`
/// - `/api/v1/input/{input}[/{sub}[/{value}]]`
///
/// Everything else gets the uniform missing response.
pub fn router(state: WebState) -> Router {
    let static_dir = state.html_path.join("static");

    let api_routes = Router::new()
        .route("/api/v1/config", get(handlers::get_config))
        .route("/api/v1/config/plugins", get(handlers::get_config_plugins))
        .route("/api/v1/output/{name}", get(handlers::get_output))
        .route("/api/v1/output/{name}/{sub}", get(handlers::get_output))
        .route("/api/v1/output/{name}/{sub}/{value}", get(handlers::get_output))
        .route("/api/v1/input/{name}", get(handlers::get_input))
        .route("/api/v1/input/{name}/{sub}", get(handlers::get_input))
        .route("/api/v1/input/{name}/{sub}/{value}", get(handlers::get_input))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/", get(handlers::get_index))
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let mut static_routes = Router::new();
    for (prefix, dir) in [
        ("/css", "css"),
        ("/js", "js"),
        ("/images", "images"),
        ("/img", "images"),
        ("/image", "images"),
    ] {
        static_routes = static_routes.nest_service(prefix, ServeDir::new(static_dir.join(dir)));
    }

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(static_routes)
        .fallback(handlers::missing)
        .layer(axum_middleware::from_fn_with_state(state, count_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn count_requests(State(state): State<WebState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    state.requests.record(response.status().is_client_error());
    response
}

/// Bind `addr` and serve `app` until `shutdown` is cancelled.
pub async fn start_server(
    addr: &str,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), PollerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PollerError::Server {
            message: format!("failed to bind webserver to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webserver listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| PollerError::Server {
            message: format!("webserver error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webserver stopped");
    Ok(())
}
