// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The status web server packaged as an output plugin.
//!
//! Registering the server like any other output lets its `[webserver]`
//! section flow through the same resolution pipeline, and gives it a state
//! container for lifecycle events.

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use poller_core::{Event, PluginRole, PollerError, PollerPlugin};
use poller_plugin::Catalog;

use crate::server::{self, WebState};

/// Name and config section of the web server plugin.
pub const WEB_PLUGIN_NAME: &str = "webserver";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 37288;

/// Event group the server records its own lifecycle in.
pub const SERVER_EVENT_GROUP: &str = "server";

/// Settings of the `[webserver]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory holding `index.html` and `static/`.
    #[serde(default = "default_html_path")]
    pub html_path: PathBuf,

    /// Events kept per group in every plugin's container; 0 keeps all.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_html_path() -> PathBuf {
    PathBuf::from("/usr/local/share/poller/web")
}

fn default_max_events() -> usize {
    200
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enable: false,
            port: default_port(),
            bind_address: default_bind_address(),
            html_path: default_html_path(),
            max_events: default_max_events(),
        }
    }
}

impl WebConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Output plugin that serves the status surface.
pub struct WebPlugin {
    config: ArcSwap<WebConfig>,
}

impl WebPlugin {
    pub fn new() -> Self {
        Self {
            config: ArcSwap::from_pointee(WebConfig::default()),
        }
    }

    /// The last config accepted by [`PollerPlugin::configure`].
    pub fn config(&self) -> Arc<WebConfig> {
        self.config.load_full()
    }

    /// Register a fresh instance in `catalog` as an output.
    pub fn register(catalog: &Catalog) -> Result<Arc<Self>, PollerError> {
        let plugin = Arc::new(Self::new());
        catalog.register(PluginRole::Output, plugin.clone())?;
        Ok(plugin)
    }

    /// Serve until `shutdown` fires. Returns immediately when disabled.
    pub async fn run(&self, state: WebState, shutdown: CancellationToken) -> Result<(), PollerError> {
        let config = self.config();
        if !config.enable {
            info!("webserver disabled");
            return Ok(());
        }

        for role in PluginRole::ALL {
            for entry in state.catalog.entries(role) {
                entry.state().set_max_events(config.max_events);
            }
        }
        if let Some(entry) = state.catalog.lookup(PluginRole::Output, WEB_PLUGIN_NAME) {
            entry.state().record_event(
                SERVER_EVENT_GROUP,
                Event::new("webserver started").with_tag("addr", config.listen_addr()),
            );
        }

        let app = server::router(state.with_html_path(config.html_path.clone()));
        server::start_server(&config.listen_addr(), app, shutdown).await
    }
}

impl Default for WebPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerPlugin for WebPlugin {
    fn name(&self) -> &str {
        WEB_PLUGIN_NAME
    }

    fn module_path(&self) -> &str {
        module_path!()
    }

    fn default_config(&self) -> serde_json::Value {
        serde_json::to_value(WebConfig::default())
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PollerError> {
        let parsed: WebConfig = serde_json::from_value(config.clone())
            .map_err(|e| PollerError::Config(format!("[{WEB_PLUGIN_NAME}]: {e}")))?;
        if parsed.enable && parsed.port == 0 {
            return Err(PollerError::Config(format!(
                "[{WEB_PLUGIN_NAME}]: port must be set when enabled"
            )));
        }
        self.config.store(Arc::new(parsed));
        Ok(())
    }
}
