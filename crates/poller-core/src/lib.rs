// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the metrics poller.
//!
//! This crate provides the error taxonomy, the data types held in plugin
//! state containers, and the [`PollerPlugin`] trait every input and output
//! plugin implements.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BoxError, PollerError};
pub use traits::PollerPlugin;
pub use types::{
    Client, Counters, Device, Event, EventGroup, Events, PluginDescriptor, PluginRole, Site,
};

/// Module path and version of this crate, for the build manifest.
pub const MODULE: (&str, &str) = (env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
