// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait that every input and output plugin implements.

use crate::error::PollerError;

/// Capability interface for a poller plugin.
///
/// A plugin is registered under a [`PluginRole`](crate::types::PluginRole) in the
/// catalog. Its configuration lives in the catalog's state container as an
/// opaque JSON value; the plugin only supplies defaults and checks the
/// resolved value in [`configure`](PollerPlugin::configure).
pub trait PollerPlugin: Send + Sync + 'static {
    /// Unique name within the plugin's role.
    fn name(&self) -> &str;

    /// Module path the plugin was compiled from, e.g. `poller_web::plugin`.
    ///
    /// Used to look the plugin's version up in the build manifest.
    fn module_path(&self) -> &str;

    /// Top-level config section holding this plugin's settings.
    fn config_key(&self) -> &str {
        self.name()
    }

    /// Configuration the plugin starts with before file and env overrides.
    fn default_config(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }

    /// Accepts the resolved configuration before the plugin starts.
    ///
    /// Returning an error aborts startup; a plugin never silently runs with
    /// defaults after a bad config.
    fn configure(&self, config: &serde_json::Value) -> Result<(), PollerError> {
        let _ = config;
        Ok(())
    }
}

impl std::fmt::Debug for dyn PollerPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollerPlugin")
            .field("name", &self.name())
            .field("module_path", &self.module_path())
            .finish()
    }
}
