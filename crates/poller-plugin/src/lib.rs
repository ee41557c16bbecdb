// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin catalog, per-plugin state containers, build manifest, and dynamic
//! module loading.
//!
//! The catalog holds every registered input and output plugin. Each entry
//! owns a reader/writer-locked [`PluginState`] that the polling loop writes
//! and the status surface reads.

pub mod catalog;
pub mod loader;
pub mod manifest;
pub mod state;
pub mod static_plugin;

pub use catalog::{Catalog, CatalogEntry};
pub use loader::{
    load_modules, normalize_module_path, resolve_module_path, DylibLoader, ModuleLoader,
    PluginDeclaration, PluginRegistrar, DEFAULT_MODULE_DIR,
};
pub use manifest::BuildManifest;
pub use state::{EventsSnapshot, PluginData, PluginState};
pub use static_plugin::StaticPlugin;

/// Module path and version of this crate, for the build manifest.
pub const MODULE: (&str, &str) = (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
