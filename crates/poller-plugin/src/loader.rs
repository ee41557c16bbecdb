// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic plugin modules.
//!
//! A module is a shared library that exports a [`PluginDeclaration`] under
//! the symbol `POLLER_PLUGIN_DECLARATION` (see [`export_plugin!`](crate::export_plugin)).
//! The host checks the declared ABI and core versions before calling the
//! module's `register` function with a staging [`PluginRegistrar`]. Staged
//! plugins reach the [`Catalog`] only after the whole module registered
//! cleanly, so a failing module leaves the catalog untouched.

use std::env::consts::DLL_SUFFIX;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;
use tracing::{debug, info};

use poller_core::{BoxError, PluginRole, PollerError, PollerPlugin};

use crate::catalog::Catalog;

/// Bumped whenever [`PluginDeclaration`] or [`PluginRegistrar`] change shape.
pub const PLUGIN_ABI_VERSION: u32 = 1;

/// Version of the plugin crate a module must have been built against.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Symbol every dynamic module exports.
pub const DECLARATION_SYMBOL: &[u8] = b"POLLER_PLUGIN_DECLARATION\0";

/// Directory searched when a configured module path does not exist as given.
#[cfg(not(windows))]
pub const DEFAULT_MODULE_DIR: &str = "/usr/local/lib/poller";
#[cfg(windows)]
pub const DEFAULT_MODULE_DIR: &str = "C:\\ProgramData\\poller\\plugins";

/// Entry point exported by a dynamic module.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PluginDeclaration {
    pub abi_version: u32,
    pub core_version: &'static str,
    pub register: fn(&mut PluginRegistrar),
}

/// Staging area a module registers its plugins into.
#[derive(Default)]
pub struct PluginRegistrar {
    staged: Vec<(PluginRole, Arc<dyn PollerPlugin>)>,
}

impl PluginRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_input(&mut self, plugin: Arc<dyn PollerPlugin>) {
        self.staged.push((PluginRole::Input, plugin));
    }

    pub fn register_output(&mut self, plugin: Arc<dyn PollerPlugin>) {
        self.staged.push((PluginRole::Output, plugin));
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Move every staged plugin into `catalog`.
    ///
    /// On any name collision nothing is registered.
    pub fn commit(self, catalog: &Catalog) -> Result<usize, PollerError> {
        catalog.register_all(self.staged)
    }
}

/// Opens a module and lets it register plugins.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path, registrar: &mut PluginRegistrar) -> Result<(), BoxError>;
}

/// Loads modules as shared libraries with `libloading`.
///
/// Opened libraries are kept for the life of the loader; plugin vtables point
/// into them, so they are never closed while the process runs.
#[derive(Default)]
pub struct DylibLoader {
    libraries: Mutex<Vec<Library>>,
}

impl DylibLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> usize {
        self.libraries.lock().len()
    }
}

impl ModuleLoader for DylibLoader {
    fn load(&self, path: &Path, registrar: &mut PluginRegistrar) -> Result<(), BoxError> {
        // SAFETY: opening a library runs its initializers; modules listed in
        // the config are trusted by the operator.
        let library = unsafe { Library::new(path) }?;

        // SAFETY: the symbol is a `PluginDeclaration` static written by `export_plugin!`.
        let declaration = unsafe {
            let symbol = library.get::<*const PluginDeclaration>(DECLARATION_SYMBOL)?;
            (*symbol).read()
        };

        if declaration.abi_version != PLUGIN_ABI_VERSION {
            return Err(format!(
                "abi version mismatch: module={}, host={PLUGIN_ABI_VERSION}",
                declaration.abi_version
            )
            .into());
        }
        if declaration.core_version != CORE_VERSION {
            return Err(format!(
                "built against poller-plugin {}, host runs {CORE_VERSION}",
                declaration.core_version
            )
            .into());
        }

        catch_unwind(AssertUnwindSafe(|| (declaration.register)(registrar)))
            .map_err(|_| "module panicked during registration")?;

        self.libraries.lock().push(library);
        Ok(())
    }
}

/// Normalizes a configured module path to carry the shared-library suffix.
///
/// `foo` and `foo.so` both become `foo.so` (with the platform suffix). A path
/// that is nothing but the suffix yields `None` and is skipped.
pub fn normalize_module_path(path: &str) -> Option<String> {
    let name = format!("{}{DLL_SUFFIX}", path.strip_suffix(DLL_SUFFIX).unwrap_or(path));
    if name == DLL_SUFFIX {
        None
    } else {
        Some(name)
    }
}

/// Uses `name` as-is when it exists, otherwise looks inside `search_dir`.
pub fn resolve_module_path(name: &str, search_dir: &Path) -> PathBuf {
    let literal = Path::new(name);
    if literal.exists() {
        literal.to_path_buf()
    } else {
        search_dir.join(name)
    }
}

/// Load every configured module in order and commit its plugins.
///
/// A module listed more than once is opened only the first time. Returns the
/// paths actually loaded. The first failure aborts.
pub fn load_modules(
    catalog: &Catalog,
    paths: &[String],
    search_dir: &Path,
    loader: &dyn ModuleLoader,
) -> Result<Vec<PathBuf>, PollerError> {
    let mut loaded = Vec::new();

    for configured in paths {
        let Some(name) = normalize_module_path(configured) else {
            debug!(path = %configured, "skipping empty plugin path");
            continue;
        };
        let path = resolve_module_path(&name, search_dir);
        if loaded.contains(&path) {
            debug!(path = %path.display(), "plugin module already loaded");
            continue;
        }
        info!(path = %path.display(), "loading dynamic plugin");

        let mut registrar = PluginRegistrar::new();
        loader
            .load(&path, &mut registrar)
            .map_err(|source| PollerError::PluginLoad {
                path: path.display().to_string(),
                source,
            })?;
        let count = registrar.commit(catalog)?;
        debug!(path = %path.display(), plugins = count, "dynamic plugin registered");

        loaded.push(path);
    }

    Ok(loaded)
}

/// Declares the entry point of a dynamic plugin module.
///
/// ```ignore
/// fn register(registrar: &mut poller_plugin::PluginRegistrar) {
///     registrar.register_input(std::sync::Arc::new(MyInput::default()));
/// }
/// poller_plugin::export_plugin!(register);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($register:expr) => {
        #[doc(hidden)]
        #[unsafe(no_mangle)]
        pub static POLLER_PLUGIN_DECLARATION: $crate::loader::PluginDeclaration =
            $crate::loader::PluginDeclaration {
                abi_version: $crate::loader::PLUGIN_ABI_VERSION,
                core_version: $crate::loader::CORE_VERSION,
                register: $register,
            };
    };
}
