// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugin for deterministic testing.
//!
//! `MockPlugin` implements `PollerPlugin`, captures every config it is handed
//! and can be told to reject configuration.

use std::sync::Arc;

use parking_lot::Mutex;

use poller_core::{PollerError, PollerPlugin};

/// A plugin that records the configs it receives.
pub struct MockPlugin {
    name: String,
    module_path: String,
    config_key: Option<String>,
    defaults: serde_json::Value,
    reject: Option<String>,
    configured: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockPlugin {
    /// Mock with an empty default config whose module path is
    /// `poller_test_utils::mock_plugin`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_path: module_path!().to_string(),
            config_key: None,
            defaults: serde_json::Value::Object(serde_json::Map::new()),
            reject: None,
            configured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = path.into();
        self
    }

    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    pub fn with_defaults(mut self, defaults: serde_json::Value) -> Self {
        self.defaults = defaults;
        self
    }

    /// Make `configure` fail with `message`.
    pub fn rejecting(mut self, message: impl Into<String>) -> Self {
        self.reject = Some(message.into());
        self
    }

    /// Every config passed to `configure`, in call order.
    pub fn configured(&self) -> Vec<serde_json::Value> {
        self.configured.lock().clone()
    }
}

impl PollerPlugin for MockPlugin {
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
        self.configured.lock().push(config.clone());
        match &self.reject {
            Some(message) => Err(PollerError::Config(message.clone())),
            None => Ok(()),
        }
    }
}
