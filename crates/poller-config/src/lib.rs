// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the poller.
//!
//! One config file (TOML, JSON or YAML) feeds the core `[poller]` section and
//! every plugin's own section. Each section is layered as defaults, then the
//! file, then `POLLER_<SECTION>_<FIELD>` environment overrides. Errors render
//! as miette diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use poller_config::{ConfigResolver, ConfigSource};
//! use poller_plugin::{Catalog, DylibLoader};
//!
//! let catalog = Arc::new(Catalog::default());
//! let source = ConfigSource::file("/etc/poller/poller.conf").expect("config file");
//! let resolved = ConfigResolver::new(source, catalog, Arc::new(DylibLoader::default()))
//!     .run()
//!     .expect("config errors");
//! println!("modules loaded: {}", resolved.loaded_modules.len());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod resolver;

pub use diagnostic::{diagnose, render_errors, ConfigError};
pub use loader::{
    default_config_paths, env_prefix, find_config_file, ConfigFormat, ConfigSource,
    CONFIG_FILE_ENV, CONFIG_FILE_NAME, ENV_PREFIX,
};
pub use model::{CoreConfig, PollerSection, POLLER_SECTION};
pub use resolver::{ConfigResolver, ResolvedConfig};

/// Crate name and version, for the build manifest.
pub const MODULE: (&str, &str) = (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

/// Open the config file at `path`, or the first default location that exists.
pub fn open_source(path: Option<&std::path::Path>) -> Result<ConfigSource, poller_core::PollerError> {
    match path {
        Some(path) => ConfigSource::file(path),
        None => ConfigSource::file(find_config_file(&default_config_paths())?),
    }
}
