// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers daemon-wide settings only. Per-plugin fields (addresses, ports,
//! paths) are validated by the plugin factories when sources are built.

use crate::diagnostic::ConfigError;
use crate::model::FwddConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FwddConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.daemon.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "daemon.log_level `{}` is not one of {}",
                config.daemon.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.input.pipeline_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "input.pipeline_capacity must be at least 1".to_string(),
        });
    }

    for (i, plugin) in config.input.plugins.iter().enumerate() {
        if let Some(id) = plugin.id()
            && id.trim().is_empty()
        {
            errors.push(ConfigError::Validation {
                message: format!("input.plugins[{i}].id must not be empty when set"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PluginConfig, UdpPluginConfig};

    fn udp(id: Option<&str>) -> PluginConfig {
        PluginConfig::Udp(UdpPluginConfig {
            id: id.map(str::to_string),
            host: "127.0.0.1".to_string(),
            port: 19000,
            tags: Default::default(),
            attributes: Default::default(),
            max_datagram_size: 65507,
        })
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&FwddConfig::default()).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = FwddConfig::default();
        config.daemon.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = FwddConfig::default();
        config.daemon.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_pipeline_capacity_fails_validation() {
        let mut config = FwddConfig::default();
        config.input.pipeline_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn blank_plugin_id_fails_validation() {
        let mut config = FwddConfig::default();
        config.input.plugins = vec![udp(Some("edge")), udp(Some("  "))];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("plugins[1]"))));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = FwddConfig::default();
        config.daemon.log_level = "loud".to_string();
        config.input.pipeline_capacity = 0;
        config.input.plugins = vec![udp(Some(""))];
        assert_eq!(validate_config(&config).unwrap_err().len(), 3);
    }
}
