// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by sources, factories, and the input manager.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique key of one configured source instance.
///
/// Only used to keep internal bindings apart; downstream consumers never see it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    /// Identity derived from a plugin's position in the configuration list.
    pub fn ordinal(index: usize) -> Self {
        Identity(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

/// Built-in input plugin kinds. The string form is the config `type` tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Udp,
    Tcp,
    Http,
}

/// Health status reported by source health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Source is accepting input.
    Healthy,
    /// Source is running but experiencing issues.
    Degraded(String),
    /// Source is not accepting input.
    Unhealthy(String),
}

/// Lifecycle phase a report or aggregate failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LifecyclePhase {
    Start,
    Stop,
}

/// State of the input manager. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ManagerState {
    Constructed,
    Started,
    Stopped,
}

/// A decoded telemetry event as submitted by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    /// Event key, e.g. the service name.
    pub key: String,

    #[serde(default)]
    pub value: Option<f64>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Time-to-live in seconds.
    #[serde(default)]
    pub ttl: Option<u32>,

    /// Event time. Defaults to the time the event was decoded.
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl Event {
    /// Create an event with only a key and value set.
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            host: None,
            state: None,
            description: None,
            ttl: None,
            time: Utc::now(),
            tags: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Merge source-level tags and attributes into this event.
    ///
    /// Attributes already present on the event take precedence.
    pub fn with_defaults(
        mut self,
        tags: &BTreeSet<String>,
        attributes: &BTreeMap<String, String>,
    ) -> Self {
        self.tags.extend(tags.iter().cloned());
        for (k, v) in attributes {
            self.attributes
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ordinal_identity_is_decimal_index() {
        assert_eq!(Identity::ordinal(0).as_str(), "0");
        assert_eq!(Identity::ordinal(12).to_string(), "12");
    }

    #[test]
    fn plugin_type_uses_lowercase_tags() {
        assert_eq!(PluginType::Udp.to_string(), "udp");
        assert_eq!(PluginType::from_str("http").unwrap(), PluginType::Http);
        assert!(PluginType::from_str("carbon").is_err());
    }

    #[test]
    fn event_defaults_time_and_collections() {
        let event: Event = serde_json::from_str(r#"{"key":"cpu","value":0.5}"#).unwrap();
        assert_eq!(event.key, "cpu");
        assert_eq!(event.value, Some(0.5));
        assert!(event.tags.is_empty());
        assert!(event.attributes.is_empty());
    }

    #[test]
    fn event_rejects_unknown_fields() {
        let result = serde_json::from_str::<Event>(r#"{"key":"cpu","metric":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn with_defaults_keeps_event_attributes() {
        let mut event = Event::new("disk", 3.0);
        event.attributes.insert("site".into(), "lon".into());
        event.tags.insert("a".into());

        let tags = BTreeSet::from(["b".to_string()]);
        let attributes = BTreeMap::from([
            ("site".to_string(), "ams".to_string()),
            ("role".to_string(), "db".to_string()),
        ]);
        let merged = event.with_defaults(&tags, &attributes);

        assert_eq!(merged.tags.len(), 2);
        assert_eq!(merged.attributes["site"], "lon");
        assert_eq!(merged.attributes["role"], "db");
    }

    #[test]
    fn manager_state_display() {
        assert_eq!(ManagerState::Constructed.to_string(), "constructed");
        assert_eq!(LifecyclePhase::Stop.to_string(), "stop");
    }
}
