// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build manifest: the module paths and versions compiled into the binary.
//!
//! The catalog uses it to fill in [`PluginDescriptor::version`](poller_core::PluginDescriptor)
//! from a plugin's module path. The manifest is built once at startup and is
//! read-only afterwards, so it is shared as a plain `Arc` without a lock.

use std::collections::BTreeMap;

/// Read-only `module path -> version` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildManifest {
    modules: BTreeMap<String, String>,
}

impl BuildManifest {
    /// Build a manifest from `(crate or module name, version)` pairs.
    ///
    /// Cargo package names are normalized to their Rust module spelling
    /// (`poller-web` becomes `poller_web`) so they line up with `module_path!()`.
    pub fn from_modules<I, K, V>(modules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            modules: modules
                .into_iter()
                .map(|(path, version)| (normalize_module(path.as_ref()), version.into()))
                .collect(),
        }
    }

    /// Version of the module `path` was compiled from.
    ///
    /// Tries an exact module match first, then the crate root of `path`
    /// (`poller_web::plugin` falls back to `poller_web`).
    pub fn version_of(&self, path: &str) -> Option<&str> {
        let path = normalize_module(path);
        if let Some(version) = self.modules.get(&path) {
            return Some(version);
        }
        let root = path.split("::").next()?;
        self.modules.get(root).map(String::as_str)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn normalize_module(path: &str) -> String {
    path.trim().replace('-', "_")
}
