// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for fwdd.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::{BTreeMap, BTreeSet};

use fwdd_core::{PluginType, DEFAULT_PIPELINE_CAPACITY};
use serde::{Deserialize, Serialize};

/// Top-level fwdd configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FwddConfig {
    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Input plugins and the shared inbound pipeline.
    #[serde(default)]
    pub input: InputConfig,
}

/// Process-level daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Input side configuration.
///
/// ```toml
/// [[input.plugins]]
/// type = "udp"
/// port = 19000
///
/// [[input.plugins]]
/// type = "http"
/// port = 8080
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Configured input plugins, in start order. Absent means none.
    #[serde(default)]
    pub plugins: Vec<PluginConfig>,

    /// Number of events the shared pipeline buffers before applying backpressure.
    #[serde(default = "default_pipeline_capacity")]
    pub pipeline_capacity: usize,

    /// Abort the daemon when any source fails to start. When false the daemon
    /// keeps running with the sources that did start.
    #[serde(default = "default_abort_on_start_failure")]
    pub abort_on_start_failure: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            pipeline_capacity: default_pipeline_capacity(),
            abort_on_start_failure: default_abort_on_start_failure(),
        }
    }
}

fn default_pipeline_capacity() -> usize {
    DEFAULT_PIPELINE_CAPACITY
}

fn default_abort_on_start_failure() -> bool {
    true
}

/// One configured input plugin, discriminated by its `type` tag.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PluginConfig {
    Udp(UdpPluginConfig),
    Tcp(TcpPluginConfig),
    Http(HttpPluginConfig),
}

impl PluginConfig {
    /// The plugin kind named by the `type` tag.
    pub fn plugin_type(&self) -> PluginType {
        match self {
            PluginConfig::Udp(_) => PluginType::Udp,
            PluginConfig::Tcp(_) => PluginType::Tcp,
            PluginConfig::Http(_) => PluginType::Http,
        }
    }

    /// Explicit identity override, if configured.
    pub fn id(&self) -> Option<&str> {
        match self {
            PluginConfig::Udp(c) => c.id.as_deref(),
            PluginConfig::Tcp(c) => c.id.as_deref(),
            PluginConfig::Http(c) => c.id.as_deref(),
        }
    }
}

/// UDP listener: one or more newline-separated JSON events per datagram.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UdpPluginConfig {
    /// Explicit identity. Defaults to the plugin's position in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Address to bind: an IP literal or `localhost`.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,

    /// Tags added to every event received by this plugin.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Attributes added to every event received by this plugin.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Largest datagram accepted, in bytes.
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

/// TCP listener: newline-delimited JSON events per connection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TcpPluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Longest line accepted, in bytes. Longer lines close the connection.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

/// HTTP listener: JSON event or array of events posted to `path`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpPluginConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Route events are posted to.
    #[serde(default = "default_http_path")]
    pub path: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_datagram_size() -> usize {
    65507
}

fn default_max_line_length() -> usize {
    65536
}

fn default_http_path() -> String {
    "/v1/events".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugins_default_to_empty() {
        let config: FwddConfig = toml::from_str("[input]\n").unwrap();
        assert!(config.input.plugins.is_empty());
        assert_eq!(config.input.pipeline_capacity, DEFAULT_PIPELINE_CAPACITY);
        assert!(config.input.abort_on_start_failure);
    }

    #[test]
    fn plugins_keep_configuration_order() {
        let toml_str = r#"
[[input.plugins]]
type = "udp"
port = 1234

[[input.plugins]]
type = "http"
port = 8080

[[input.plugins]]
type = "tcp"
port = 5555
"#;
        let config: FwddConfig = toml::from_str(toml_str).unwrap();
        let types: Vec<PluginType> = config.input.plugins.iter().map(|p| p.plugin_type()).collect();
        assert_eq!(types, vec![PluginType::Udp, PluginType::Http, PluginType::Tcp]);
    }

    #[test]
    fn plugin_fields_default() {
        let toml_str = r#"
[[input.plugins]]
type = "http"
port = 8080
"#;
        let config: FwddConfig = toml::from_str(toml_str).unwrap();
        match &config.input.plugins[0] {
            PluginConfig::Http(http) => {
                assert_eq!(http.host, "127.0.0.1");
                assert_eq!(http.path, "/v1/events");
                assert!(http.id.is_none());
                assert!(http.tags.is_empty());
            }
            other => panic!("expected http plugin, got {other:?}"),
        }
        assert!(config.input.plugins[0].id().is_none());
    }

    #[test]
    fn plugin_tags_and_attributes_deserialize() {
        let toml_str = r#"
[[input.plugins]]
type = "udp"
id = "edge"
port = 19000
tags = ["a", "b"]
attributes = { site = "ams" }
"#;
        let config: FwddConfig = toml::from_str(toml_str).unwrap();
        let plugin = &config.input.plugins[0];
        assert_eq!(plugin.id(), Some("edge"));
        match plugin {
            PluginConfig::Udp(udp) => {
                assert_eq!(udp.tags.len(), 2);
                assert_eq!(udp.attributes["site"], "ams");
                assert_eq!(udp.max_datagram_size, 65507);
            }
            other => panic!("expected udp plugin, got {other:?}"),
        }
    }

    #[test]
    fn unknown_plugin_type_is_rejected() {
        let toml_str = r#"
[[input.plugins]]
type = "carbon"
port = 2003
"#;
        assert!(toml::from_str::<FwddConfig>(toml_str).is_err());
    }

    #[test]
    fn plugin_deny_unknown_fields() {
        let toml_str = r#"
[[input.plugins]]
type = "tcp"
port = 5555
protocol = "tcp"
"#;
        assert!(toml::from_str::<FwddConfig>(toml_str).is_err());
    }

    #[test]
    fn missing_port_is_rejected() {
        let toml_str = r#"
[[input.plugins]]
type = "udp"
"#;
        assert!(toml::from_str::<FwddConfig>(toml_str).is_err());
    }
}
