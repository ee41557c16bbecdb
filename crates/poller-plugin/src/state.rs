// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-plugin state container.
//!
//! Each registered plugin owns one [`PluginState`]: its resolved config, an
//! event log keyed by group, a counter table, and (for inputs) the site,
//! device and client inventory. The polling loop writes through the
//! `with_write` / setter methods while the web surface reads snapshots; every
//! access happens under the container's reader/writer lock.

use parking_lot::RwLock;
use serde::Serialize;

use poller_core::types::filter_by_site;
use poller_core::{Client, Counters, Device, Event, EventGroup, Events, Site};

/// The data guarded by a [`PluginState`] lock.
#[derive(Debug, Clone, Default)]
pub struct PluginData {
    pub config: serde_json::Value,
    pub events: Events,
    pub counters: Counters,
    pub sites: Vec<Site>,
    pub devices: Vec<Device>,
    pub clients: Vec<Client>,
    /// Per-group event cap applied by [`PluginState::record_event`]; 0 = unbounded.
    pub max_events: usize,
}

/// Result of an events query.
///
/// An empty key returns the whole log; a key returns that group alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventsSnapshot {
    All(Events),
    Group(EventGroup),
}

/// Reader/writer-locked state of one plugin.
///
/// The lock never poisons: a panic inside `with_write` releases the guard
/// during unwinding and later readers proceed.
#[derive(Debug, Default)]
pub struct PluginState {
    inner: RwLock<PluginData>,
}

impl PluginState {
    /// Create a container seeded with the plugin's default config.
    pub fn new(config: serde_json::Value) -> Self {
        Self {
            inner: RwLock::new(PluginData {
                config,
                ..Default::default()
            }),
        }
    }

    /// Run `f` under the read lock.
    pub fn with_read<R>(&self, f: impl FnOnce(&PluginData) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` under the write lock.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut PluginData) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    pub fn snapshot_config(&self) -> serde_json::Value {
        self.with_read(|data| data.config.clone())
    }

    /// Events for `key`, or the whole log when `key` is empty.
    ///
    /// Returns `None` when a non-empty key has no group. An existing group
    /// with no events is still `Some`.
    pub fn snapshot_events(&self, key: &str) -> Option<EventsSnapshot> {
        self.with_read(|data| {
            if key.is_empty() {
                Some(EventsSnapshot::All(data.events.clone()))
            } else {
                data.events.get(key).cloned().map(EventsSnapshot::Group)
            }
        })
    }

    /// Counters for `key`, or the whole table when `key` is empty.
    ///
    /// A missing key reads as zero, never as not-found.
    pub fn snapshot_counters(&self, key: &str) -> Counters {
        self.with_read(|data| {
            if key.is_empty() {
                data.counters.clone()
            } else {
                let value = data.counters.get(key).copied().unwrap_or_default();
                Counters::from([(key.to_string(), value)])
            }
        })
    }

    /// Every group whose key starts with `prefix`, with its events.
    pub fn group_events(&self, prefix: &str) -> Events {
        self.with_read(|data| {
            data.events
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, group)| (key.clone(), group.clone()))
                .collect()
        })
    }

    pub fn snapshot_sites(&self) -> Vec<Site> {
        self.with_read(|data| data.sites.clone())
    }

    /// Devices of `site_id`, or all of them when it is empty.
    pub fn snapshot_devices(&self, site_id: &str) -> Vec<Device> {
        self.with_read(|data| filter_by_site(&data.devices, site_id))
    }

    /// Clients of `site_id`, or all of them when it is empty.
    pub fn snapshot_clients(&self, site_id: &str) -> Vec<Client> {
        self.with_read(|data| filter_by_site(&data.clients, site_id))
    }

    pub fn set_config(&self, config: serde_json::Value) {
        self.with_write(|data| data.config = config);
    }

    pub fn set_max_events(&self, max: usize) {
        self.with_write(|data| data.max_events = max);
    }

    /// Append an event to `group`, creating the group on first use.
    pub fn record_event(&self, group: &str, event: Event) {
        self.with_write(|data| {
            let max = data.max_events;
            data.events
                .entry(group.to_string())
                .or_default()
                .push(event, max);
        });
    }

    /// Add `delta` to a counter and return the new value.
    pub fn add_counter(&self, key: &str, delta: i64) -> i64 {
        self.with_write(|data| {
            let value = data.counters.entry(key.to_string()).or_default();
            *value += delta;
            *value
        })
    }

    pub fn set_counter(&self, key: &str, value: i64) {
        self.with_write(|data| {
            data.counters.insert(key.to_string(), value);
        });
    }

    /// Replace the whole counter table in one write.
    pub fn set_counters(&self, counters: Counters) {
        self.with_write(|data| data.counters = counters);
    }

    pub fn set_sites(&self, sites: Vec<Site>) {
        self.with_write(|data| data.sites = sites);
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        self.with_write(|data| data.devices = devices);
    }

    pub fn set_clients(&self, clients: Vec<Client>) {
        self.with_write(|data| data.clients = clients);
    }
}
