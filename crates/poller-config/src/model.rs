// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core configuration model.
//!
//! The config file is shared by the core and every plugin: the `[poller]`
//! section belongs to the core, every other top-level section belongs to the
//! plugin whose `config_key()` matches it. Only the core section rejects
//! unknown keys; plugins validate their own sections.

use serde::{Deserialize, Serialize};

/// Section name of the core settings.
pub const POLLER_SECTION: &str = "poller";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub poller: PollerSection,
}

/// Global poller settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerSection {
    /// Dynamic plugin modules to load, by path or bare name.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Enable debug logging.
    #[serde(default)]
    pub debug: bool,

    /// Only log warnings and errors.
    #[serde(default)]
    pub quiet: bool,
}

impl CoreConfig {
    /// Log filter directive implied by the debug/quiet flags.
    ///
    /// Debug wins when both are set.
    pub fn log_level(&self) -> &'static str {
        if self.poller.debug {
            "debug"
        } else if self.poller.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let config = CoreConfig::default();
        assert!(config.poller.plugins.is_empty());
        assert!(!config.poller.debug);
        assert!(!config.poller.quiet);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn log_level_follows_flags() {
        let mut config = CoreConfig::default();
        config.poller.quiet = true;
        assert_eq!(config.log_level(), "warn");
        config.poller.debug = true;
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn poller_section_serializes_all_fields() {
        let json = serde_json::to_value(PollerSection::default()).unwrap();
        assert_eq!(json, serde_json::json!({"plugins": [], "debug": false, "quiet": false}));
    }
}
