// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input side of the fwdd daemon.
//!
//! [`InputManager`] turns the configured plugin list into running sources:
//! each record is given an identity, built by the [`FactoryTable`] entry for
//! its plugin type, bound to the one shared [`InboundPipeline`] and stored in
//! an ordered [`SourceRegistry`]. Starting and stopping visit every source and
//! return a [`LifecycleReport`] describing each outcome.
//!
//! [`InboundPipeline`]: fwdd_core::InboundPipeline

pub mod factory;
pub mod manager;
pub mod plugins;
pub mod registry;
pub mod report;

pub use factory::{FactoryTable, PluginFactory};
pub use manager::InputManager;
pub use plugins::{HttpFactory, HttpSource, TcpFactory, TcpSource, UdpFactory, UdpSource};
pub use registry::{SourceEntry, SourceRegistry, SourceRegistryBuilder};
pub use report::{LifecycleReport, SourceOutcome};
