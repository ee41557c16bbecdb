// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for layered config resolution.
//!
//! Every test that resolves a section runs inside a `figment::Jail` so the
//! environment variables one test sets never leak into another.

use std::path::Path;
use std::sync::{Arc, Mutex};

use figment::Jail;
use serde_json::json;

use poller_config::diagnostic::ConfigError;
use poller_config::{diagnose, ConfigResolver, ConfigSource, PollerSection};
use poller_core::{BoxError, PluginRole, PollerError};
use poller_plugin::{Catalog, ModuleLoader, PluginRegistrar, StaticPlugin};

/// Registers an input plugin named after each module file it is asked to load.
#[derive(Default)]
struct StemLoader {
    loaded: Mutex<Vec<String>>,
}

impl ModuleLoader for StemLoader {
    fn load(&self, path: &Path, registrar: &mut PluginRegistrar) -> Result<(), BoxError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or("module without a file name")?
            .to_string();
        self.loaded.lock().unwrap().push(stem.clone());
        registrar.register_input(Arc::new(
            StaticPlugin::new(&stem, format!("{}_plugin", stem.replace('-', "_")))
                .with_defaults(json!({"interval": 30, "verify_ssl": true})),
        ));
        Ok(())
    }
}

fn resolver_for(path: &str, catalog: Arc<Catalog>) -> Result<ConfigResolver, PollerError> {
    Ok(ConfigResolver::new(ConfigSource::file(path)?, catalog, Arc::new(StemLoader::default()))
        .with_module_dir("modules"))
}

#[test]
fn file_then_env_layering_for_plugin_sections() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "poller.conf",
            r#"
[poller]
plugins = ["metrics-input"]

[metrics-input]
interval = 10
url = "https://unifi.local"
"#,
        )?;
        jail.set_env("POLLER_METRICS_INPUT_INTERVAL", "5");
        jail.set_env("POLLER_METRICS_INPUT_AUTH__USER", "admin");

        let catalog = Arc::new(Catalog::default());
        let resolved = resolver_for("poller.conf", Arc::clone(&catalog))
            .and_then(|r| r.run())
            .map_err(|e| e.to_string())?;
        assert_eq!(resolved.loaded_modules.len(), 1);

        let entry = catalog
            .get(PluginRole::Input, "metrics-input")
            .map_err(|e| e.to_string())?;
        assert_eq!(
            entry.state().snapshot_config(),
            json!({
                "interval": 5,
                "url": "https://unifi.local",
                "verify_ssl": true,
                "auth": {"user": "admin"},
            })
        );
        Ok(())
    });
}

#[test]
fn env_variables_go_to_the_longest_matching_section() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "poller.conf",
            "[poller]\nplugins = [\"metrics-input\"]\n\n[metrics]\nurl = \"http://db:8086\"\n",
        )?;
        jail.set_env("POLLER_METRICS_INPUT_INTERVAL", "5");
        jail.set_env("POLLER_METRICS_DB", "unifi");
        jail.set_env("POLLER_CONFIG_FILE", "poller.conf");

        let catalog = Arc::new(Catalog::default());
        catalog
            .register(PluginRole::Output, Arc::new(StaticPlugin::new("metrics", "metrics_output")))
            .map_err(|e| e.to_string())?;
        catalog
            .register(PluginRole::Output, Arc::new(StaticPlugin::new("config", "config_output")))
            .map_err(|e| e.to_string())?;
        resolver_for("poller.conf", Arc::clone(&catalog))
            .and_then(|r| r.run())
            .map_err(|e| e.to_string())?;

        let metrics = catalog.get(PluginRole::Output, "metrics").map_err(|e| e.to_string())?;
        assert_eq!(
            metrics.state().snapshot_config(),
            json!({"url": "http://db:8086", "db": "unifi"})
        );
        let input = catalog
            .get(PluginRole::Input, "metrics-input")
            .map_err(|e| e.to_string())?;
        assert_eq!(input.state().snapshot_config()["interval"], 5);
        let config = catalog.get(PluginRole::Output, "config").map_err(|e| e.to_string())?;
        assert_eq!(config.state().snapshot_config(), json!({}));
        Ok(())
    });
}

#[test]
fn env_overrides_core_section() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.conf", "[poller]\nquiet = true\n")?;
        jail.set_env("POLLER_POLLER_DEBUG", "true");

        let resolver = resolver_for("poller.conf", Arc::new(Catalog::default()))
            .map_err(|e| e.to_string())?;
        let core = resolver.resolve_core().map_err(|e| e.to_string())?;
        assert!(core.poller.debug);
        assert!(core.poller.quiet);
        assert_eq!(core.log_level(), "debug");
        Ok(())
    });
}

#[test]
fn bad_env_override_is_env_parse_error() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.conf", "[poller]\n")?;
        jail.set_env("POLLER_POLLER_DEBUG", "sometimes");

        let err = resolver_for("poller.conf", Arc::new(Catalog::default()))
            .and_then(|r| r.run())
            .unwrap_err();
        match &err {
            PollerError::EnvParse { section, .. } => assert_eq!(section, "poller"),
            other => panic!("expected EnvParse, got {other:?}"),
        }
        assert!(matches!(diagnose(&err)[0], ConfigError::EnvOverride { .. }));
        Ok(())
    });
}

#[test]
fn malformed_file_is_config_parse_error() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.conf", "[poller\nplugins = \n")?;
        let err = resolver_for("poller.conf", Arc::new(Catalog::default()))
            .and_then(|r| r.run())
            .unwrap_err();
        assert!(matches!(err, PollerError::ConfigParse { .. }), "got {err:?}");
        Ok(())
    });
}

#[test]
fn unknown_core_key_points_into_file() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.conf", "[poller]\nplugin = [\"x\"]\n")?;
        let err = resolver_for("poller.conf", Arc::new(Catalog::default()))
            .and_then(|r| r.run())
            .unwrap_err();

        let errors = diagnose(&err);
        match &errors[0] {
            ConfigError::UnknownKey {
                key,
                suggestion,
                valid_keys,
                ..
            } => {
                assert_eq!(key, "plugin");
                assert_eq!(suggestion.as_deref(), Some("plugins"));
                assert!(valid_keys.contains("quiet"));
            }
            other => panic!("expected UnknownKey, got {other:?}"),
        }
        Ok(())
    });
}

#[test]
fn unknown_plugin_keys_are_kept() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.conf", "[influx]\nurl = \"http://db\"\nextra = 1\n")?;

        let catalog = Arc::new(Catalog::default());
        catalog
            .register(PluginRole::Output, Arc::new(StaticPlugin::new("influx", "influx")))
            .map_err(|e| e.to_string())?;
        resolver_for("poller.conf", Arc::clone(&catalog))
            .and_then(|r| r.run())
            .map_err(|e| e.to_string())?;

        let entry = catalog
            .get(PluginRole::Output, "influx")
            .map_err(|e| e.to_string())?;
        assert_eq!(entry.state().snapshot_config(), json!({"url": "http://db", "extra": 1}));
        Ok(())
    });
}

#[test]
fn missing_module_stops_before_plugin_sections() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.conf", "[poller]\nplugins = [\"/no/such/module.so\"]\n")?;

        /// Loader whose modules never open.
        struct Broken;
        impl ModuleLoader for Broken {
            fn load(&self, path: &Path, _: &mut PluginRegistrar) -> Result<(), BoxError> {
                Err(format!("cannot open {}", path.display()).into())
            }
        }

        let catalog = Arc::new(Catalog::default());
        catalog
            .register(
                PluginRole::Input,
                Arc::new(StaticPlugin::new("early", "early").with_defaults(json!({"a": 1}))),
            )
            .map_err(|e| e.to_string())?;

        let source = ConfigSource::file("poller.conf").map_err(|e| e.to_string())?;
        let err = ConfigResolver::new(source, Arc::clone(&catalog), Arc::new(Broken))
            .run()
            .unwrap_err();
        assert!(matches!(err, PollerError::PluginLoad { .. }), "got {err:?}");
        assert_eq!(catalog.len(PluginRole::Input), 1);
        Ok(())
    });
}

#[test]
fn json_and_yaml_files_resolve_like_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("poller.json", r#"{"poller": {"debug": true}, "web": {"port": 1}}"#)?;
        jail.create_file("poller.yaml", "poller:\n  debug: true\nweb:\n  port: 1\n")?;

        for file in ["poller.json", "poller.yaml"] {
            let source = ConfigSource::file(file).map_err(|e| e.to_string())?;
            let core: PollerSection = source
                .resolve_section("poller", PollerSection::default())
                .map_err(|e| e.to_string())?;
            assert!(core.debug, "{file}");
            let web = source
                .resolve_section("web", json!({}))
                .map_err(|e| e.to_string())?;
            assert_eq!(web, json!({"port": 1}), "{file}");
        }
        Ok(())
    });
}

#[test]
fn empty_source_uses_defaults_and_env() {
    Jail::expect_with(|jail| {
        jail.set_env("POLLER_WEB_PORT", "9999");
        let web = ConfigSource::empty()
            .resolve_section("web", json!({"port": 1, "enable": false}))
            .map_err(|e| e.to_string())?;
        assert_eq!(web, json!({"port": 9999, "enable": false}));
        Ok(())
    });
}
