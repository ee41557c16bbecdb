// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module loader stand-in that "loads" compile-time plugin sets.
//!
//! `RecordingLoader` maps module file stems to the plugins the module would
//! register, so config tests can list modules in `poller.plugins` without
//! building shared libraries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use poller_core::{BoxError, PluginRole, PollerPlugin};
use poller_plugin::{ModuleLoader, PluginRegistrar};

type ModuleFactory = Arc<dyn Fn() -> Vec<(PluginRole, Arc<dyn PollerPlugin>)> + Send + Sync>;

/// A loader whose modules are closures keyed by file stem.
#[derive(Default)]
pub struct RecordingLoader {
    modules: HashMap<String, ModuleFactory>,
    failing: HashMap<String, String>,
    loads: Mutex<Vec<PathBuf>>,
}

impl RecordingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Module `stem` registers whatever `factory` returns on each load.
    pub fn with_module<F>(mut self, stem: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Vec<(PluginRole, Arc<dyn PollerPlugin>)> + Send + Sync + 'static,
    {
        self.modules.insert(stem.into(), Arc::new(factory));
        self
    }

    /// Loading module `stem` fails with `message`.
    pub fn with_failing_module(mut self, stem: impl Into<String>, message: impl Into<String>) -> Self {
        self.failing.insert(stem.into(), message.into());
        self
    }

    /// Every path `load` was called with, in order.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().clone()
    }
}

impl ModuleLoader for RecordingLoader {
    fn load(&self, path: &Path, registrar: &mut PluginRegistrar) -> Result<(), BoxError> {
        self.loads.lock().push(path.to_path_buf());

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("{}: no file name", path.display()))?;
        if let Some(message) = self.failing.get(stem) {
            return Err(message.clone().into());
        }
        let factory = self
            .modules
            .get(stem)
            .ok_or_else(|| format!("{}: cannot open shared object file", path.display()))?;

        for (role, plugin) in factory() {
            match role {
                PluginRole::Input => registrar.register_input(plugin),
                PluginRole::Output => registrar.register_output(plugin),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_plugin::MockPlugin;
    use poller_plugin::Catalog;

    #[test]
    fn known_module_registers_its_plugins() {
        let loader = RecordingLoader::new().with_module("metrics-input", || {
            vec![(
                PluginRole::Input,
                Arc::new(MockPlugin::new("metrics-input")) as Arc<dyn PollerPlugin>,
            )]
        });
        let mut registrar = PluginRegistrar::new();
        loader
            .load(Path::new("/mods/metrics-input.so"), &mut registrar)
            .unwrap();

        let catalog = Catalog::default();
        assert_eq!(registrar.commit(&catalog).unwrap(), 1);
        assert_eq!(loader.loads(), vec![PathBuf::from("/mods/metrics-input.so")]);
    }

    #[test]
    fn unknown_and_failing_modules_error() {
        let loader = RecordingLoader::new().with_failing_module("bad", "symbol not found");
        let mut registrar = PluginRegistrar::new();
        assert!(loader.load(Path::new("other.so"), &mut registrar).is_err());
        let err = loader.load(Path::new("bad.so"), &mut registrar).unwrap_err();
        assert_eq!(err.to_string(), "symbol not found");
        assert!(registrar.is_empty());
    }
}
