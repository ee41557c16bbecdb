// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the status surface.
//!
//! Plugin handlers resolve the plugin through the catalog before touching
//! any plugin lock, copy what they need under that plugin's read lock, and
//! serialize only after the lock is released.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use poller_config::PollerSection;
use poller_core::{PluginDescriptor, PluginRole};

use crate::runtime::{BuildInfo, MemoryStats, RuntimeInfo};
use crate::server::{RequestCounts, WebState};

/// Body of the uniform missing response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingResponse {
    pub error: String,
    pub path: String,
}

/// Body of `/api/v1/config/plugins`.
#[derive(Debug, Serialize)]
pub struct PluginsResponse {
    pub inputs: BTreeMap<String, PluginDescriptor>,
    pub outputs: BTreeMap<String, PluginDescriptor>,
}

/// Body of `/api/v1/config`.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    #[serde(flatten)]
    pub plugins: PluginsResponse,
    pub poller: PollerSection,
    #[serde(flatten)]
    pub build: BuildInfo,
    #[serde(flatten)]
    pub runtime: RuntimeInfo,
    #[serde(flatten)]
    pub memory: MemoryStats,
    /// Requests served by this surface since start.
    pub webserver: RequestCounts,
}

/// Captured segments of `/api/v1/{role}/{name}[/{sub}[/{value}]]`.
#[derive(Debug, Deserialize)]
pub struct PluginPath {
    pub name: String,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// 404 with `{"error": "missing resource", "path": ...}`.
pub fn missing_response(path: &str) -> Response {
    debug!(path, "missing resource");
    (
        StatusCode::NOT_FOUND,
        Json(MissingResponse {
            error: "missing resource".to_string(),
            path: path.to_string(),
        }),
    )
        .into_response()
}

/// Fallback for every unrouted path.
pub async fn missing(uri: Uri) -> Response {
    missing_response(uri.path())
}

/// GET /
pub async fn get_index(State(state): State<WebState>, request: Request) -> Response {
    let index = state.html_path.join("index.html");
    match ServeFile::new(index).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// GET /health
pub async fn get_health() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], "OK")
}

fn plugins(state: &WebState) -> PluginsResponse {
    PluginsResponse {
        inputs: state.catalog.list_descriptors(PluginRole::Input),
        outputs: state.catalog.list_descriptors(PluginRole::Output),
    }
}

/// GET /api/v1/config
pub async fn get_config(State(state): State<WebState>) -> Json<ConfigResponse> {
    let memory = state
        .memory_stats
        .as_ref()
        .map(|source| source())
        .unwrap_or_default();

    Json(ConfigResponse {
        plugins: plugins(&state),
        poller: (*state.poller).clone(),
        build: (*state.build).clone(),
        runtime: RuntimeInfo::collect(state.start),
        memory,
        webserver: state.requests.snapshot(),
    })
}

/// GET /api/v1/config/plugins
pub async fn get_config_plugins(State(state): State<WebState>) -> Json<PluginsResponse> {
    Json(plugins(&state))
}

/// GET /api/v1/output/{name}[/{sub}[/{value}]]
pub async fn get_output(
    State(state): State<WebState>,
    Path(path): Path<PluginPath>,
    uri: Uri,
) -> Response {
    plugin_response(&state, PluginRole::Output, path, &uri)
}

/// GET /api/v1/input/{name}[/{sub}[/{value}]]
pub async fn get_input(
    State(state): State<WebState>,
    Path(path): Path<PluginPath>,
    uri: Uri,
) -> Response {
    plugin_response(&state, PluginRole::Input, path, &uri)
}

fn plugin_response(state: &WebState, role: PluginRole, path: PluginPath, uri: &Uri) -> Response {
    let Some(entry) = state.catalog.lookup(role, &path.name) else {
        return missing_response(uri.path());
    };
    let plugin = entry.state();
    let value = path.value.as_deref().unwrap_or_default();
    let bare = path.value.is_none();

    match (path.sub.as_deref(), role) {
        (None | Some("config"), _) if bare => Json(plugin.snapshot_config()).into_response(),
        (Some("eventgroups"), _) => Json(plugin.group_events(value)).into_response(),
        (Some("events"), _) => match plugin.snapshot_events(value) {
            Some(events) => Json(events).into_response(),
            None => missing_response(uri.path()),
        },
        (Some("counters"), _) => Json(plugin.snapshot_counters(value)).into_response(),
        (Some("sites"), PluginRole::Input) if bare => {
            Json(plugin.snapshot_sites()).into_response()
        }
        (Some("devices"), PluginRole::Input) => Json(plugin.snapshot_devices(value)).into_response(),
        (Some("clients"), PluginRole::Input) => Json(plugin.snapshot_clients(value)).into_response(),
        _ => missing_response(uri.path()),
    }
}
