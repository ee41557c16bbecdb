// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full startup path (catalog, webserver plugin,
//! resolver, router) from an inline config string, with a temp directory
//! standing in for the module search dir and the HTML root. Provides `get()`
//! to drive the router without binding a socket.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use poller_config::{ConfigFormat, ConfigResolver, ConfigSource, ResolvedConfig};
use poller_core::{PluginRole, PollerError, PollerPlugin};
use poller_plugin::{BuildManifest, Catalog, CatalogEntry};
use poller_web::{MemoryStatsFn, WebPlugin, WebState};

use crate::mock_loader::RecordingLoader;

/// Index page written into the harness HTML root.
pub const INDEX_HTML: &str = "<html><body>poller</body></html>";

/// Manifest of the workspace crates the harness links.
pub fn workspace_manifest() -> BuildManifest {
    BuildManifest::from_modules([
        poller_core::MODULE,
        poller_plugin::MODULE,
        poller_config::MODULE,
        poller_web::MODULE,
        (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    ])
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: String,
    format: ConfigFormat,
    loader: RecordingLoader,
    plugins: Vec<(PluginRole, Arc<dyn PollerPlugin>)>,
    memory_stats: Option<MemoryStatsFn>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: String::new(),
            format: ConfigFormat::Toml,
            loader: RecordingLoader::new(),
            plugins: Vec::new(),
            memory_stats: None,
        }
    }

    /// Inline TOML config.
    pub fn with_config(mut self, toml: impl Into<String>) -> Self {
        self.config = toml.into();
        self.format = ConfigFormat::Toml;
        self
    }

    pub fn with_config_format(mut self, content: impl Into<String>, format: ConfigFormat) -> Self {
        self.config = content.into();
        self.format = format;
        self
    }

    /// Loader consulted for every `poller.plugins` entry.
    pub fn with_loader(mut self, loader: RecordingLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Compile-time plugin registered before the resolver runs.
    pub fn with_plugin(mut self, role: PluginRole, plugin: Arc<dyn PollerPlugin>) -> Self {
        self.plugins.push((role, plugin));
        self
    }

    pub fn with_memory_stats(mut self, source: MemoryStatsFn) -> Self {
        self.memory_stats = Some(source);
        self
    }

    /// Run the startup pipeline and build the router.
    pub fn build(self) -> Result<TestHarness, PollerError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| PollerError::Internal(format!("creating temp dir: {e}")))?;
        let html_path = temp_dir.path().join("web");
        write_site(&html_path)?;

        let catalog = Arc::new(Catalog::new(Arc::new(workspace_manifest())));
        let web = WebPlugin::register(&catalog)?;
        for (role, plugin) in self.plugins {
            catalog.register(role, plugin)?;
        }

        let loader = Arc::new(self.loader);
        let resolved = ConfigResolver::new(
            ConfigSource::from_str(&self.config, self.format),
            Arc::clone(&catalog),
            loader.clone(),
        )
        .with_module_dir(temp_dir.path().join("modules"))
        .run()?;

        let mut state = WebState::new(Arc::clone(&catalog), resolved.core.poller.clone())
            .with_html_path(html_path);
        if let Some(source) = self.memory_stats {
            state = state.with_memory_stats(source);
        }
        let router = poller_web::router(state.clone());

        Ok(TestHarness {
            catalog,
            resolved,
            web,
            loader,
            state,
            router,
            _temp_dir: temp_dir,
        })
    }
}

fn write_site(root: &std::path::Path) -> Result<(), PollerError> {
    let io = |e: std::io::Error| PollerError::Internal(format!("writing test site: {e}"));
    std::fs::create_dir_all(root.join("static/css")).map_err(io)?;
    std::fs::create_dir_all(root.join("static/images")).map_err(io)?;
    std::fs::write(root.join("index.html"), INDEX_HTML).map_err(io)?;
    std::fs::write(root.join("static/css/app.css"), "body { margin: 0; }").map_err(io)?;
    std::fs::write(root.join("static/images/logo.svg"), "<svg/>").map_err(io)?;
    Ok(())
}

/// A fully resolved poller with its status router.
pub struct TestHarness {
    pub catalog: Arc<Catalog>,
    pub resolved: ResolvedConfig,
    /// The registered webserver plugin.
    pub web: Arc<WebPlugin>,
    pub loader: Arc<RecordingLoader>,
    pub state: WebState,
    pub router: Router,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn input(&self, name: &str) -> Result<Arc<CatalogEntry>, PollerError> {
        self.catalog.get(PluginRole::Input, name)
    }

    pub fn output(&self, name: &str) -> Result<Arc<CatalogEntry>, PollerError> {
        self.catalog.get(PluginRole::Output, name)
    }

    /// GET `uri` through the router.
    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Bytes), PollerError> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| PollerError::Internal(format!("building request: {e}")))?;
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| PollerError::Internal(format!("reading body: {e}")))?;
        Ok((status, body))
    }

    /// GET `uri` and parse the body as JSON.
    pub async fn get_json(&self, uri: &str) -> Result<(StatusCode, serde_json::Value), PollerError> {
        let (status, body) = self.get(uri).await?;
        let json = serde_json::from_slice(&body)
            .map_err(|e| PollerError::Internal(format!("{uri}: body is not JSON: {e}")))?;
        Ok((status, json))
    }
}
