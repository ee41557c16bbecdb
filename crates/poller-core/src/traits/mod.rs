// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin trait definitions.

pub mod plugin;

pub use plugin::PollerPlugin;
