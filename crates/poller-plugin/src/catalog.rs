// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin catalog: the registered input and output plugins.
//!
//! The `Catalog` stores one table per [`PluginRole`]. Each table keeps
//! entries in registration order plus a name index for O(1) lookups, and
//! sits behind its own lock, separate from the per-plugin state locks.
//! Lookups clone an `Arc` to the entry and drop the table lock right away, so
//! queries only ever wait on the state lock of the one plugin they read.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use poller_core::{PluginDescriptor, PluginRole, PollerError, PollerPlugin};

use crate::manifest::BuildManifest;
use crate::state::PluginState;

/// A single registered plugin and its state container.
pub struct CatalogEntry {
    role: PluginRole,
    plugin: Arc<dyn PollerPlugin>,
    state: PluginState,
}

impl CatalogEntry {
    pub fn role(&self) -> PluginRole {
        self.role
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }

    pub fn plugin(&self) -> &Arc<dyn PollerPlugin> {
        &self.plugin
    }

    pub fn state(&self) -> &PluginState {
        &self.state
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("role", &self.role)
            .field("name", &self.plugin.name())
            .field("module_path", &self.plugin.module_path())
            .finish()
    }
}

/// Registration-ordered entries with a name index.
#[derive(Default)]
struct RoleTable {
    entries: Vec<Arc<CatalogEntry>>,
    index: HashMap<String, usize>,
}

fn insert(table: &mut RoleTable, role: PluginRole, plugin: Arc<dyn PollerPlugin>) -> Arc<CatalogEntry> {
    let name = plugin.name().to_string();
    let entry = Arc::new(CatalogEntry {
        role,
        state: PluginState::new(plugin.default_config()),
        plugin,
    });
    let position = table.entries.len();
    table.entries.push(Arc::clone(&entry));
    table.index.insert(name.clone(), position);

    debug!(%role, plugin = %name, path = entry.plugin.module_path(), "plugin registered");
    entry
}

/// Registry of input and output plugins.
///
/// Constructed explicitly and shared by `Arc` with the config resolver, the
/// polling loop, and the web surface.
pub struct Catalog {
    inputs: RwLock<RoleTable>,
    outputs: RwLock<RoleTable>,
    manifest: Arc<BuildManifest>,
}

impl Catalog {
    /// Create an empty catalog that resolves versions against `manifest`.
    pub fn new(manifest: Arc<BuildManifest>) -> Self {
        Self {
            inputs: RwLock::new(RoleTable::default()),
            outputs: RwLock::new(RoleTable::default()),
            manifest,
        }
    }

    fn table(&self, role: PluginRole) -> &RwLock<RoleTable> {
        match role {
            PluginRole::Input => &self.inputs,
            PluginRole::Output => &self.outputs,
        }
    }

    pub fn manifest(&self) -> &Arc<BuildManifest> {
        &self.manifest
    }

    /// Register `plugin` under `role` and create its state container.
    ///
    /// The container is seeded with `plugin.default_config()`.
    pub fn register(
        &self,
        role: PluginRole,
        plugin: Arc<dyn PollerPlugin>,
    ) -> Result<Arc<CatalogEntry>, PollerError> {
        let mut table = self.table(role).write();
        if table.index.contains_key(plugin.name()) {
            return Err(PollerError::DuplicateName {
                role,
                name: plugin.name().to_string(),
            });
        }
        Ok(insert(&mut table, role, plugin))
    }

    /// Register a batch of plugins, all or none.
    ///
    /// Both role tables stay write-locked from the name check to the last
    /// insert, so a concurrent registration cannot land in between.
    pub fn register_all(
        &self,
        plugins: Vec<(PluginRole, Arc<dyn PollerPlugin>)>,
    ) -> Result<usize, PollerError> {
        // Fixed lock order: inputs, then outputs.
        let mut inputs = self.inputs.write();
        let mut outputs = self.outputs.write();

        let mut batch: HashSet<(PluginRole, &str)> = HashSet::new();
        for (role, plugin) in &plugins {
            let table = match role {
                PluginRole::Input => &inputs,
                PluginRole::Output => &outputs,
            };
            if table.index.contains_key(plugin.name()) || !batch.insert((*role, plugin.name())) {
                return Err(PollerError::DuplicateName {
                    role: *role,
                    name: plugin.name().to_string(),
                });
            }
        }
        drop(batch);

        let count = plugins.len();
        for (role, plugin) in plugins {
            let table = match role {
                PluginRole::Input => &mut inputs,
                PluginRole::Output => &mut outputs,
            };
            insert(table, role, plugin);
        }
        Ok(count)
    }

    /// Find a plugin by name. A miss is `None`, not an error.
    pub fn lookup(&self, role: PluginRole, name: &str) -> Option<Arc<CatalogEntry>> {
        let table = self.table(role).read();
        table
            .index
            .get(name)
            .map(|&position| Arc::clone(&table.entries[position]))
    }

    /// Like [`lookup`](Self::lookup) but returns [`PollerError::NotFound`] on a miss.
    pub fn get(&self, role: PluginRole, name: &str) -> Result<Arc<CatalogEntry>, PollerError> {
        self.lookup(role, name)
            .ok_or_else(|| PollerError::not_found(format!("{role} plugin"), name))
    }

    /// Entries of `role` in registration order.
    pub fn entries(&self, role: PluginRole) -> Vec<Arc<CatalogEntry>> {
        self.table(role).read().entries.clone()
    }

    /// Names of `role` in registration order.
    pub fn list_names(&self, role: PluginRole) -> Vec<String> {
        self.table(role)
            .read()
            .entries
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Descriptors of `role` keyed by plugin name.
    ///
    /// Versions come from the build manifest; a module path with no manifest
    /// entry keeps an empty version.
    pub fn list_descriptors(&self, role: PluginRole) -> BTreeMap<String, PluginDescriptor> {
        self.entries(role)
            .iter()
            .map(|entry| {
                let path = entry.plugin.module_path().to_string();
                let version = self
                    .manifest
                    .version_of(&path)
                    .unwrap_or_default()
                    .to_string();
                let name = entry.name().to_string();
                (
                    name.clone(),
                    PluginDescriptor {
                        name,
                        version,
                        path,
                    },
                )
            })
            .collect()
    }

    /// Run `f` over the entries of `role` in registration order while holding
    /// the table lock exclusively, so no registration can interleave.
    pub fn with_role_locked<R>(
        &self,
        role: PluginRole,
        f: impl FnOnce(&[Arc<CatalogEntry>]) -> R,
    ) -> R {
        let table = self.table(role).write();
        f(&table.entries)
    }

    pub fn len(&self, role: PluginRole) -> usize {
        self.table(role).read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        PluginRole::ALL.iter().all(|&role| self.len(role) == 0)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Arc::new(BuildManifest::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_plugin::StaticPlugin;
    use serde_json::json;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn plugin(name: &str, path: &str) -> Arc<dyn PollerPlugin> {
        Arc::new(StaticPlugin::new(name, path).with_defaults(json!({"name": name})))
    }

    #[test]
    fn register_and_lookup_roundtrip() {
        let catalog = Catalog::default();
        catalog
            .register(PluginRole::Input, plugin("unifi", "unifi_input"))
            .unwrap();

        let entry = catalog.lookup(PluginRole::Input, "unifi").unwrap();
        assert_eq!(entry.name(), "unifi");
        assert_eq!(entry.role(), PluginRole::Input);
        assert_eq!(entry.state().snapshot_config(), json!({"name": "unifi"}));
    }

    #[test]
    fn lookup_is_scoped_by_role() {
        let catalog = Catalog::default();
        catalog
            .register(PluginRole::Output, plugin("influx", "influx_output"))
            .unwrap();
        assert!(catalog.lookup(PluginRole::Input, "influx").is_none());
        assert!(catalog.lookup(PluginRole::Output, "influx").is_some());
    }

    #[test]
    fn same_name_allowed_across_roles() {
        let catalog = Catalog::default();
        catalog.register(PluginRole::Input, plugin("dual", "dual")).unwrap();
        catalog.register(PluginRole::Output, plugin("dual", "dual")).unwrap();
        assert_eq!(catalog.len(PluginRole::Input), 1);
        assert_eq!(catalog.len(PluginRole::Output), 1);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let catalog = Catalog::default();
        catalog.register(PluginRole::Input, plugin("unifi", "a")).unwrap();
        let err = catalog
            .register(PluginRole::Input, plugin("unifi", "b"))
            .unwrap_err();
        assert!(matches!(
            err,
            PollerError::DuplicateName { role: PluginRole::Input, ref name } if name == "unifi"
        ));
        // The original registration is untouched.
        let entry = catalog.lookup(PluginRole::Input, "unifi").unwrap();
        assert_eq!(entry.plugin().module_path(), "a");
    }

    #[test]
    fn get_returns_not_found() {
        let catalog = Catalog::default();
        let err = catalog.get(PluginRole::Input, "ghost").unwrap_err();
        assert!(matches!(err, PollerError::NotFound { .. }));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn entries_preserve_registration_order() {
        let catalog = Catalog::default();
        for name in ["zebra", "alpha", "middle"] {
            catalog.register(PluginRole::Output, plugin(name, name)).unwrap();
        }
        assert_eq!(
            catalog.list_names(PluginRole::Output),
            vec!["zebra", "alpha", "middle"]
        );
        let seen = catalog.with_role_locked(PluginRole::Output, |entries| {
            entries.iter().map(|e| e.name().to_string()).collect::<Vec<_>>()
        });
        assert_eq!(seen, vec!["zebra", "alpha", "middle"]);
    }

    #[test]
    fn list_descriptors_resolves_versions_best_effort() {
        let manifest = BuildManifest::from_modules([("poller-web", "0.4.2")]);
        let catalog = Catalog::new(Arc::new(manifest));
        catalog
            .register(PluginRole::Output, plugin("webserver", "poller_web::plugin"))
            .unwrap();
        catalog
            .register(PluginRole::Output, plugin("custom", "somewhere_else"))
            .unwrap();

        let descriptors = catalog.list_descriptors(PluginRole::Output);
        assert_eq!(descriptors["webserver"].version, "0.4.2");
        assert_eq!(descriptors["webserver"].path, "poller_web::plugin");
        assert_eq!(descriptors["custom"].version, "");
        assert_eq!(descriptors["custom"].path, "somewhere_else");
        assert!(catalog.list_descriptors(PluginRole::Input).is_empty());
    }

    #[test]
    fn is_empty_tracks_both_roles() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        catalog.register(PluginRole::Output, plugin("o", "o")).unwrap();
        assert!(!catalog.is_empty());
    }

    #[test]
    fn lookup_does_not_wait_on_plugin_writers() {
        let catalog = Arc::new(Catalog::default());
        catalog.register(PluginRole::Input, plugin("busy", "busy")).unwrap();
        catalog.register(PluginRole::Input, plugin("idle", "idle")).unwrap();

        let busy = catalog.lookup(PluginRole::Input, "busy").unwrap();
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let writer = thread::spawn(move || {
            busy.state().with_write(|_| {
                locked_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            });
        });
        locked_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let reader_catalog = Arc::clone(&catalog);
        let reader = thread::spawn(move || {
            let entry = reader_catalog.lookup(PluginRole::Input, "idle").unwrap();
            done_tx.send(entry.state().snapshot_config()).unwrap();
        });
        let config = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("lookup and read of another plugin must not block");
        assert_eq!(config, json!({"name": "idle"}));

        release_tx.send(()).unwrap();
        writer.join().unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn register_all_is_all_or_nothing() {
        let catalog = Catalog::default();
        catalog.register(PluginRole::Output, plugin("influx", "influx")).unwrap();

        let err = catalog
            .register_all(vec![
                (PluginRole::Input, plugin("unifi", "m")),
                (PluginRole::Output, plugin("influx", "m")),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            PollerError::DuplicateName { role: PluginRole::Output, .. }
        ));
        assert!(catalog.lookup(PluginRole::Input, "unifi").is_none());

        let count = catalog
            .register_all(vec![
                (PluginRole::Input, plugin("unifi", "m")),
                (PluginRole::Output, plugin("prometheus", "m")),
            ])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(catalog.list_names(PluginRole::Output), vec!["influx", "prometheus"]);
    }

    #[test]
    fn racing_batches_commit_whole_or_not_at_all() {
        let catalog = Arc::new(Catalog::default());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || {
                    let input = format!("input-{i}");
                    catalog.register_all(vec![
                        (PluginRole::Input, plugin(&input, "m")),
                        (PluginRole::Output, plugin("shared", "m")),
                    ])
                })
            })
            .collect();
        let committed = workers
            .into_iter()
            .map(|w| w.join().unwrap())
            .filter(Result::is_ok)
            .count();

        assert_eq!(committed, 1);
        assert_eq!(catalog.len(PluginRole::Input), 1);
        assert_eq!(catalog.len(PluginRole::Output), 1);
    }
}
