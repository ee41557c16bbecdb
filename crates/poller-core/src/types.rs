// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the catalog, the config resolver, and the web surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which side of the pipeline a plugin sits on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PluginRole {
    /// Produces metrics and events.
    Input,
    /// Consumes aggregated metrics.
    Output,
}

impl PluginRole {
    /// Both roles, inputs first. Resolution and listing follow this order.
    pub const ALL: [PluginRole; 2] = [PluginRole::Input, PluginRole::Output];

    /// Plural key used in JSON maps (`inputs` / `outputs`).
    pub fn plural(&self) -> &'static str {
        match self {
            PluginRole::Input => "inputs",
            PluginRole::Output => "outputs",
        }
    }
}

/// Identity record of a registered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    /// Empty when the module path has no build manifest entry.
    pub version: String,
    /// Module path the plugin was compiled from.
    pub path: String,
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,
    pub msg: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Event {
    /// Create an event stamped with the current time.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            msg: msg.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Attach a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Ordered events stored under one group key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventGroup {
    pub latest: Option<DateTime<Utc>>,
    pub events: Vec<Event>,
}

impl EventGroup {
    /// Append an event, dropping the oldest ones beyond `max` (0 = unbounded).
    pub fn push(&mut self, event: Event, max: usize) {
        if self.latest.is_none_or(|latest| event.ts > latest) {
            self.latest = Some(event.ts);
        }
        self.events.push(event);
        if max > 0 && self.events.len() > max {
            let excess = self.events.len() - max;
            self.events.drain(..excess);
        }
    }
}

/// Event log keyed by group.
pub type Events = BTreeMap<String, EventGroup>;

/// Counter table keyed by counter name.
pub type Counters = BTreeMap<String, i64>;

/// A site known to an input plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Controller or source the site was polled from.
    #[serde(default)]
    pub source: String,
}

/// A network device reported by an input plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(rename = "siteId")]
    pub site_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ip: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub uptime: u64,
    #[serde(default)]
    pub clients: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

/// A client station reported by an input plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(rename = "siteId")]
    pub site_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub ip: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "deviceMac", default)]
    pub device_mac: String,
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub tx_bytes: u64,
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last: Option<DateTime<Utc>>,
}

/// Records that belong to a site and can be filtered by it.
pub trait SiteScoped {
    fn site_id(&self) -> &str;
}

impl SiteScoped for Device {
    fn site_id(&self) -> &str {
        &self.site_id
    }
}

impl SiteScoped for Client {
    fn site_id(&self) -> &str {
        &self.site_id
    }
}

/// Returns every record when `site_id` is empty, otherwise the records of that site.
pub fn filter_by_site<T: SiteScoped + Clone>(items: &[T], site_id: &str) -> Vec<T> {
    if site_id.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.site_id() == site_id)
        .cloned()
        .collect()
}
