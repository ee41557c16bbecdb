// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative plugin for modules that only need a name, a module path, and
//! default settings.

use poller_core::{PollerError, PollerPlugin};

/// A plugin described entirely by data.
///
/// Dynamic modules and simple compiled-in plugins use this instead of a
/// hand-written [`PollerPlugin`] impl. The resolved config must be a JSON
/// object; anything else is rejected.
#[derive(Debug, Clone)]
pub struct StaticPlugin {
    name: String,
    module_path: String,
    config_key: Option<String>,
    defaults: serde_json::Value,
}

impl StaticPlugin {
    pub fn new(name: impl Into<String>, module_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_path: module_path.into(),
            config_key: None,
            defaults: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// Read settings from `key` instead of the plugin name.
    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    pub fn with_defaults(mut self, defaults: serde_json::Value) -> Self {
        self.defaults = defaults;
        self
    }
}

impl PollerPlugin for StaticPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn module_path(&self) -> &str {
        &self.module_path
    }

    fn config_key(&self) -> &str {
        self.config_key.as_deref().unwrap_or(&self.name)
    }

    fn default_config(&self) -> serde_json::Value {
        self.defaults.clone()
    }

    fn configure(&self, config: &serde_json::Value) -> Result<(), PollerError> {
        if config.is_object() {
            Ok(())
        } else {
            Err(PollerError::Config(format!(
                "plugin `{}`: section `{}` must be a table",
                self.name,
                self.config_key()
            )))
        }
    }
}
