// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin factories and the closed table that maps plugin types to them.
//!
//! A factory turns one `PluginConfig` record into a ready-to-run `Source`.
//! Validation happens here, so a bad address or port fails daemon wiring
//! before anything is started. No sockets are opened by a factory.

use std::collections::HashMap;
use std::sync::Arc;

use fwdd_config::PluginConfig;
use fwdd_core::{FwddError, Identity, InboundPipeline, PluginType, Source};

use crate::plugins::http::HttpFactory;
use crate::plugins::tcp::TcpFactory;
use crate::plugins::udp::UdpFactory;

/// Factory trait for creating sources from configuration.
pub trait PluginFactory: Send + Sync {
    /// The plugin type this factory produces.
    fn plugin_type(&self) -> PluginType;

    /// Build a source bound to `identity` and the shared `pipeline`.
    ///
    /// Returns `FwddError::Config` if `config` is not a record of this
    /// factory's plugin type or if any field is malformed.
    fn build(
        &self,
        identity: Identity,
        config: &PluginConfig,
        pipeline: Arc<InboundPipeline>,
    ) -> Result<Arc<dyn Source>, FwddError>;
}

/// Mapping from plugin type to the factory that builds it.
///
/// Populated explicitly; there is no discovery.
pub struct FactoryTable {
    factories: HashMap<PluginType, Box<dyn PluginFactory>>,
}

impl FactoryTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Table with the built-in `udp`, `tcp`, and `http` factories.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.register(Box::new(UdpFactory));
        table.register(Box::new(TcpFactory));
        table.register(Box::new(HttpFactory));
        table
    }

    /// Register a factory under its plugin type, returning any factory it replaced.
    pub fn register(
        &mut self,
        factory: Box<dyn PluginFactory>,
    ) -> Option<Box<dyn PluginFactory>> {
        self.factories.insert(factory.plugin_type(), factory)
    }

    /// Look up the factory for a plugin type.
    pub fn get(&self, plugin_type: PluginType) -> Option<&dyn PluginFactory> {
        self.factories.get(&plugin_type).map(|f| f.as_ref())
    }

    /// Build a source for `config` using the matching factory.
    pub fn build(
        &self,
        identity: Identity,
        config: &PluginConfig,
        pipeline: Arc<InboundPipeline>,
    ) -> Result<Arc<dyn Source>, FwddError> {
        let plugin_type = config.plugin_type();
        let factory = self.get(plugin_type).ok_or_else(|| {
            FwddError::Config(format!(
                "no factory registered for plugin type `{plugin_type}` (source `{identity}`)"
            ))
        })?;
        factory.build(identity, config, pipeline)
    }

    /// Plugin types with a registered factory, sorted by tag.
    pub fn plugin_types(&self) -> Vec<PluginType> {
        let mut types: Vec<PluginType> = self.factories.keys().copied().collect();
        types.sort_by_key(|t| t.to_string());
        types
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for FactoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryTable")
            .field("plugin_types", &self.plugin_types())
            .finish()
    }
}

/// Error for a factory handed a record of another plugin type.
pub(crate) fn mismatched_config(
    expected: PluginType,
    identity: &Identity,
    config: &PluginConfig,
) -> FwddError {
    FwddError::Config(format!(
        "{expected} factory cannot build source `{identity}` from a `{}` plugin record",
        config.plugin_type()
    ))
}
