// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fwdd.toml` > `~/.config/fwdd/fwdd.toml` > `/etc/fwdd/fwdd.toml`
//! with environment variable overrides via `FWDD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::FwddConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/fwdd/fwdd.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "fwdd.toml";

/// Path of the per-user config file, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fwdd/fwdd.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fwdd/fwdd.toml` (system-wide)
/// 3. `~/.config/fwdd/fwdd.toml` (user XDG config)
/// 4. `./fwdd.toml` (local directory)
/// 5. `FWDD_*` environment variables
pub fn load_config() -> Result<FwddConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FwddConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FwddConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
///
/// Unlike the XDG lookup, a missing file is an error here.
pub fn load_config_from_path(path: &Path) -> Result<FwddConfig, figment::Error> {
    if !path.is_file() {
        return Err(figment::Error::from(format!(
            "config file `{}` does not exist",
            path.display()
        )));
    }
    Figment::new()
        .merge(Serialized::defaults(FwddConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FwddConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `FWDD_INPUT_PIPELINE_CAPACITY`
/// must map to `input.pipeline_capacity`, not `input.pipeline.capacity`.
fn env_provider() -> Env {
    Env::prefixed("FWDD_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let mapped = key
            .as_str()
            .replacen("daemon_", "daemon.", 1)
            .replacen("input_", "input.", 1);
        mapped.into()
    })
}
