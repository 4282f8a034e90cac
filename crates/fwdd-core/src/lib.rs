// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the fwdd input side.
//!
//! Holds the error taxonomy, the `Source` lifecycle trait, the shared
//! `InboundPipeline`, and the event and identity types every other crate in
//! the workspace builds on.

pub mod error;
pub mod pipeline;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FwddError;
pub use pipeline::{InboundPipeline, DEFAULT_PIPELINE_CAPACITY};
pub use traits::Source;
pub use types::{Event, HealthStatus, Identity, LifecyclePhase, ManagerState, PluginType};
