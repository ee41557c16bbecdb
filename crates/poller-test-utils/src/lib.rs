// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for poller integration tests.
//!
//! Provides mock plugins, a module loader that needs no shared libraries,
//! and a harness that runs the real startup pipeline against an inline
//! config.
//!
//! # Components
//!
//! - [`MockPlugin`] - Plugin that records the configs it is handed
//! - [`RecordingLoader`] - `ModuleLoader` backed by compile-time plugin sets
//! - [`TestHarness`] - Catalog, resolver and status router in one

pub mod harness;
pub mod mock_loader;
pub mod mock_plugin;

pub use harness::{workspace_manifest, TestHarness, INDEX_HTML};
pub use mock_loader::RecordingLoader;
pub use mock_plugin::MockPlugin;
