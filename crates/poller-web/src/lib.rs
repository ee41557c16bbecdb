// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only HTTP status surface for the poller.
//!
//! Exposes the plugin catalog, each plugin's resolved config, event log,
//! counters and inventory, plus build and process facts. The server itself
//! is registered as the `webserver` output plugin.

pub mod handlers;
pub mod plugin;
pub mod runtime;
pub mod server;

pub use handlers::MissingResponse;
pub use plugin::{WebConfig, WebPlugin, WEB_PLUGIN_NAME};
pub use runtime::{BuildInfo, MemoryStats, MemoryStatsFn, RuntimeInfo};
pub use server::{router, start_server, RequestCounts, RequestStats, WebState};

/// Crate name and version, for the build manifest.
pub const MODULE: (&str, &str) = (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
