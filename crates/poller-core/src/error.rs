// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the poller workspace.

use thiserror::Error;

use crate::types::PluginRole;

/// Boxed cause carried by the wrapping error variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across the poller crates.
///
/// Everything except [`PollerError::NotFound`] is fatal during startup.
/// `NotFound` is an expected outcome of status queries and is rendered as a
/// missing-resource response, never as a server fault.
#[derive(Debug, Error)]
pub enum PollerError {
    /// The configuration file exists but could not be parsed.
    #[error("parsing config file {path}: {source}")]
    ConfigParse { path: String, source: BoxError },

    /// An environment override could not be applied.
    #[error("parsing environment overrides for `{section}`: {source}")]
    EnvParse { section: String, source: BoxError },

    /// A dynamic plugin module failed to load, declare, or register.
    #[error("opening plugin {path}: {source}")]
    PluginLoad { path: String, source: BoxError },

    /// A plugin with the same name is already registered for the role.
    #[error("{role} plugin `{name}` is already registered")]
    DuplicateName { role: PluginRole, name: String },

    /// A queried plugin, event group, or route does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// Config discovery and post-deserialization validation failures.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP listener errors.
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<BoxError>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PollerError {
    /// Shorthand for a [`PollerError::NotFound`].
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Returns true for errors that must abort startup.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }
}
