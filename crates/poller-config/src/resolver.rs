// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup configuration pipeline.
//!
//! Runs strictly in order and stops at the first error:
//!
//! 1. resolve the core `[poller]` section (file, then env)
//! 2. load the dynamic plugin modules it lists
//! 3. resolve every input plugin's section, in registration order
//! 4. resolve every output plugin's section, in registration order
//!
//! Modules load before plugin sections resolve because loading can register
//! new plugins. A plugin whose section fails to resolve aborts startup rather
//! than running on defaults.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use poller_core::{PluginRole, PollerError};
use poller_plugin::{load_modules, Catalog, ModuleLoader, DEFAULT_MODULE_DIR};

use crate::loader::ConfigSource;
use crate::model::{CoreConfig, PollerSection, POLLER_SECTION};

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub core: CoreConfig,
    /// Module files that were loaded, in config order.
    pub loaded_modules: Vec<PathBuf>,
}

/// Resolves the core config and every registered plugin's config.
pub struct ConfigResolver {
    source: ConfigSource,
    catalog: Arc<Catalog>,
    loader: Arc<dyn ModuleLoader>,
    module_dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(source: ConfigSource, catalog: Arc<Catalog>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            source,
            catalog,
            loader,
            module_dir: PathBuf::from(DEFAULT_MODULE_DIR),
        }
    }

    /// Directory searched for modules not found at their configured path.
    pub fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_dir = dir.into();
        self
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Run the whole pipeline.
    pub fn run(&self) -> Result<ResolvedConfig, PollerError> {
        self.run_with_core(self.resolve_core()?)
    }

    /// Steps 2 to 4, given a core config from [`resolve_core`](Self::resolve_core).
    ///
    /// Lets the caller act on the core section (logging setup, CLI
    /// overrides) before any module is loaded.
    pub fn run_with_core(&self, core: CoreConfig) -> Result<ResolvedConfig, PollerError> {
        let loaded_modules = self.load_plugins(&core)?;
        let inputs = self.resolve_plugins(PluginRole::Input)?;
        let outputs = self.resolve_plugins(PluginRole::Output)?;

        info!(
            config = self.source.origin(),
            modules = loaded_modules.len(),
            inputs,
            outputs,
            "configuration resolved"
        );
        Ok(ResolvedConfig {
            core,
            loaded_modules,
        })
    }

    /// Step 1: the core section.
    pub fn resolve_core(&self) -> Result<CoreConfig, PollerError> {
        let poller: PollerSection = self.source.resolve_section_among(
            POLLER_SECTION,
            PollerSection::default(),
            &self.section_keys(),
        )?;
        let core = CoreConfig { poller };
        debug!(plugins = ?core.poller.plugins, debug = core.poller.debug, quiet = core.poller.quiet, "core config resolved");
        Ok(core)
    }

    /// Step 2: dynamic modules.
    pub fn load_plugins(&self, core: &CoreConfig) -> Result<Vec<PathBuf>, PollerError> {
        load_modules(
            &self.catalog,
            &core.poller.plugins,
            &self.module_dir,
            self.loader.as_ref(),
        )
    }

    /// Steps 3 and 4: every plugin of `role`, under the role's table lock.
    ///
    /// Returns how many plugins were configured.
    pub fn resolve_plugins(&self, role: PluginRole) -> Result<usize, PollerError> {
        let sections = self.section_keys();
        self.catalog.with_role_locked(role, |entries| {
            for entry in entries {
                let plugin = entry.plugin();
                let key = plugin.config_key();

                let mut current = entry.state().snapshot_config();
                if !current.is_object() {
                    current = serde_json::Value::Object(serde_json::Map::new());
                }

                let resolved = self.source.resolve_section_among(key, current, &sections)?;
                plugin.configure(&resolved)?;
                entry.state().set_config(resolved);

                debug!(%role, plugin = plugin.name(), section = key, "plugin config resolved");
            }
            Ok(entries.len())
        })
    }

    /// Every section name in use: the core one plus each plugin's key.
    fn section_keys(&self) -> Vec<String> {
        let mut keys = vec![POLLER_SECTION.to_string()];
        for role in PluginRole::ALL {
            keys.extend(
                self.catalog
                    .entries(role)
                    .iter()
                    .map(|entry| entry.plugin().config_key().to_string()),
            );
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ConfigFormat;
    use poller_core::{BoxError, PollerPlugin};
    use poller_plugin::{PluginRegistrar, StaticPlugin};
    use serde_json::json;
    use std::path::Path;
    use std::sync::Mutex;

    /// Loader that registers one input named after the module file.
    #[derive(Default)]
    struct NamedInputLoader {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl ModuleLoader for NamedInputLoader {
        fn load(&self, path: &Path, registrar: &mut PluginRegistrar) -> Result<(), BoxError> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or("module without a file name")?;
            registrar.register_input(Arc::new(
                StaticPlugin::new(stem, format!("{stem}_module")).with_defaults(json!({"interval": 30})),
            ));
            Ok(())
        }
    }

    /// Plugin that rejects any config carrying `fail = true`.
    struct Picky(&'static str);

    impl PollerPlugin for Picky {
        fn name(&self) -> &str {
            self.0
        }

        fn module_path(&self) -> &str {
            module_path!()
        }

        fn configure(&self, config: &serde_json::Value) -> Result<(), PollerError> {
            if config["fail"] == json!(true) {
                Err(PollerError::Config(format!("{} refuses", self.0)))
            } else {
                Ok(())
            }
        }
    }

    fn resolver(toml: &str, catalog: Arc<Catalog>) -> ConfigResolver {
        ConfigResolver::new(
            ConfigSource::from_str(toml, ConfigFormat::Toml),
            catalog,
            Arc::new(NamedInputLoader::default()),
        )
        .with_module_dir("/var/empty/poller-modules")
    }

    #[test]
    fn full_pipeline_loads_modules_then_resolves_their_config() {
        let catalog = Arc::new(Catalog::default());
        let toml = r#"
[poller]
plugins = ["metrics-input"]

[metrics-input]
interval = 10
url = "https://controller.local"
"#;
        let resolved = resolver(toml, Arc::clone(&catalog)).run().unwrap();
        assert_eq!(resolved.core.poller.plugins, vec!["metrics-input"]);
        assert_eq!(resolved.loaded_modules.len(), 1);

        let entry = catalog.lookup(PluginRole::Input, "metrics-input").unwrap();
        assert_eq!(
            entry.state().snapshot_config(),
            json!({"interval": 10, "url": "https://controller.local"})
        );
    }

    #[test]
    fn plugin_defaults_survive_when_section_is_absent() {
        let catalog = Arc::new(Catalog::default());
        catalog
            .register(
                PluginRole::Output,
                Arc::new(StaticPlugin::new("influx", "influx").with_defaults(json!({"db": "unifi"}))),
            )
            .unwrap();

        resolver("", Arc::clone(&catalog)).run().unwrap();
        let entry = catalog.lookup(PluginRole::Output, "influx").unwrap();
        assert_eq!(entry.state().snapshot_config(), json!({"db": "unifi"}));
    }

    #[test]
    fn plugin_rejection_aborts_pipeline() {
        let catalog = Arc::new(Catalog::default());
        catalog.register(PluginRole::Output, Arc::new(Picky("picky"))).unwrap();
        let err = resolver("[picky]\nfail = true\n", Arc::clone(&catalog))
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("picky refuses"));
        // The rejected config never reaches the container.
        let entry = catalog.lookup(PluginRole::Output, "picky").unwrap();
        assert_eq!(entry.state().snapshot_config(), json!({}));
    }

    #[test]
    fn bad_core_field_type_aborts() {
        let err = resolver("[poller]\nplugins = 5\n", Arc::new(Catalog::default()))
            .run()
            .unwrap_err();
        assert!(matches!(err, PollerError::ConfigParse { .. }), "got {err:?}");
    }

    #[test]
    fn unknown_core_key_is_config_parse_error() {
        let err = resolver("[poller]\ndebgu = true\n", Arc::new(Catalog::default()))
            .run()
            .unwrap_err();
        assert!(matches!(err, PollerError::ConfigParse { .. }));
    }

    #[test]
    fn blank_and_suffix_only_entries_are_skipped() {
        let suffix = std::env::consts::DLL_SUFFIX;
        for toml in [
            "[poller]\nplugins = [\"\"]\n".to_string(),
            format!("[poller]\nplugins = [\"{suffix}\", \"{suffix}\"]\n"),
        ] {
            let catalog = Arc::new(Catalog::default());
            let resolved = resolver(&toml, Arc::clone(&catalog)).run().unwrap();
            assert!(resolved.loaded_modules.is_empty(), "{toml}");
            assert_eq!(catalog.len(PluginRole::Input), 0);
        }
    }

    #[test]
    fn repeated_entry_loads_module_once() {
        let catalog = Arc::new(Catalog::default());
        let resolved = resolver(
            "[poller]\nplugins = [\"metrics-input\", \"metrics-input\"]\n",
            Arc::clone(&catalog),
        )
        .run()
        .unwrap();
        assert_eq!(resolved.loaded_modules.len(), 1);
        assert_eq!(catalog.list_names(PluginRole::Input), vec!["metrics-input"]);
    }

    #[test]
    fn inputs_resolve_before_outputs() {
        let catalog = Arc::new(Catalog::default());
        catalog.register(PluginRole::Output, Arc::new(Picky("out"))).unwrap();
        catalog.register(PluginRole::Input, Arc::new(Picky("in"))).unwrap();

        // Both sections are bad; the input error must be the one reported.
        let err = resolver("[in]\nfail = true\n[out]\nfail = true\n", catalog)
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("in refuses"), "got {err}");
    }

    #[test]
    fn resolve_plugins_counts_entries() {
        let catalog = Arc::new(Catalog::default());
        for name in ["a", "b"] {
            catalog
                .register(PluginRole::Input, Arc::new(StaticPlugin::new(name, name)))
                .unwrap();
        }
        let resolver = resolver("", catalog);
        assert_eq!(resolver.resolve_plugins(PluginRole::Input).unwrap(), 2);
        assert_eq!(resolver.resolve_plugins(PluginRole::Output).unwrap(), 0);
    }
}
