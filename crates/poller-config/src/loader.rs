// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Every section, the core `[poller]` one and each plugin's, resolves the
//! same way: defaults, then the section from the config file, then
//! `POLLER_<SECTION>_<FIELD>` environment variables. The file and env layers
//! are extracted separately so a malformed file and a bad override surface
//! as different errors.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{de::DeserializeOwned, Serialize};

use poller_core::PollerError;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "POLLER";

/// Selects the config file; never read as a section override.
pub const CONFIG_FILE_ENV: &str = "POLLER_CONFIG_FILE";

/// File name looked for in the default locations.
pub const CONFIG_FILE_NAME: &str = "poller.conf";

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by the file extension; unknown extensions are TOML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            Some("yaml" | "yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

/// The parsed-on-demand config file all sections are resolved from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    origin: String,
    path: Option<PathBuf>,
    figment: Figment,
}

impl ConfigSource {
    /// Use the file at `path`; it must exist.
    pub fn file(path: impl AsRef<Path>) -> Result<Self, PollerError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PollerError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        let figment = match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => Figment::from(Toml::file(path)),
            ConfigFormat::Json => Figment::from(Json::file(path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
        };
        Ok(Self {
            origin: path.display().to_string(),
            path: Some(path.to_path_buf()),
            figment,
        })
    }

    /// Use inline content, mostly for tests.
    pub fn from_str(content: &str, format: ConfigFormat) -> Self {
        let figment = match format {
            ConfigFormat::Toml => Figment::from(Toml::string(content)),
            ConfigFormat::Json => Figment::from(Json::string(content)),
            ConfigFormat::Yaml => Figment::from(Yaml::string(content)),
        };
        Self {
            origin: "<inline>".to_string(),
            path: None,
            figment,
        }
    }

    /// No file at all; only defaults and the environment apply.
    pub fn empty() -> Self {
        Self {
            origin: "<none>".to_string(),
            path: None,
            figment: Figment::new(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolve `section` over `defaults`: file first, then env overrides.
    pub fn resolve_section<T>(&self, section: &str, defaults: T) -> Result<T, PollerError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.resolve_section_among(section, defaults, &[])
    }

    /// Like [`resolve_section`](Self::resolve_section), aware of the other
    /// `sections` in use.
    ///
    /// When another section's env prefix extends this one's (`metrics` and
    /// `metrics-input`), variables under the longer prefix belong to that
    /// section only.
    pub fn resolve_section_among<T>(
        &self,
        section: &str,
        defaults: T,
        sections: &[String],
    ) -> Result<T, PollerError>
    where
        T: Serialize + DeserializeOwned,
    {
        let from_file: T = Figment::from(Serialized::defaults(defaults))
            .merge(self.figment.focus(section))
            .extract()
            .map_err(|e| PollerError::ConfigParse {
                path: self.origin.clone(),
                source: Box::new(e),
            })?;

        Figment::from(Serialized::defaults(from_file))
            .merge(env_provider(section, sections))
            .extract()
            .map_err(|e| PollerError::EnvParse {
                section: section.to_string(),
                source: Box::new(e),
            })
    }
}

/// Environment variable prefix for `section`, e.g. `POLLER_WEBSERVER_`.
pub fn env_prefix(section: &str) -> String {
    let section: String = section
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{ENV_PREFIX}_{section}_")
}

/// Env provider scoped to one section.
///
/// Field names keep their underscores (`POLLER_WEBSERVER_HTML_PATH` sets
/// `html_path`); a double underscore descends into a nested table. Variables
/// owned by a section with a longer prefix, and [`CONFIG_FILE_ENV`], are
/// skipped.
fn env_provider(section: &str, sections: &[String]) -> Env {
    let prefix = env_prefix(section);
    let shadowing: Vec<String> = sections
        .iter()
        .map(|other| env_prefix(other))
        .filter(|other| other.len() > prefix.len() && other.starts_with(&prefix))
        .collect();

    Env::raw()
        .filter_map(move |key| {
            if !key.starts_with(&prefix)
                || key.as_str().eq_ignore_ascii_case(CONFIG_FILE_ENV)
                || shadowing.iter().any(|longer| key.starts_with(longer))
            {
                return None;
            }
            Some(key[prefix.len()..].into())
        })
        .split("__")
}

/// Default config file locations, most specific last.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/poller").join(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("poller").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

/// Returns the first candidate that exists.
pub fn find_config_file(candidates: &[PathBuf]) -> Result<PathBuf, PollerError> {
    let mut last_error = None;
    for candidate in candidates {
        match std::fs::metadata(candidate) {
            Ok(_) => return Ok(candidate.clone()),
            Err(e) => last_error = Some(format!("{}: {e}", candidate.display())),
        }
    }
    Err(PollerError::Config(format!(
        "finding config file: {}",
        last_error.unwrap_or_else(|| "no candidates given".to_string())
    )))
}
