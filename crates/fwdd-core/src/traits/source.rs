// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle trait that every input source implements.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FwddError;
use crate::pipeline::InboundPipeline;
use crate::types::{HealthStatus, Identity, PluginType};

/// A runnable input listener bound to one identity and the shared pipeline.
///
/// Sources are built by a factory without touching the network. `start`
/// opens the listener and spawns its loop onto the runtime; `stop` cancels
/// and joins it. The input manager calls each at most once per source.
#[async_trait]
pub trait Source: Send + Sync + 'static {
    /// Identity this source was registered under.
    fn identity(&self) -> &Identity;

    /// Plugin kind of this source.
    fn plugin_type(&self) -> PluginType;

    /// The pipeline this source submits events into.
    fn pipeline(&self) -> &Arc<InboundPipeline>;

    /// Address the listener is bound to, while running.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Open the listener and begin accepting input.
    async fn start(&self) -> Result<(), FwddError>;

    /// Stop accepting input and release the listener.
    async fn stop(&self) -> Result<(), FwddError>;

    /// Current health of the source.
    async fn health_check(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
