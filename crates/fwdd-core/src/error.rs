// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the fwdd input side.

use thiserror::Error;

use crate::types::{Identity, LifecyclePhase, ManagerState};

/// The primary error type used across source plugins, factories, and the input manager.
#[derive(Debug, Error)]
pub enum FwddError {
    /// Malformed or incomplete plugin configuration. Raised while wiring, before
    /// any source starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Two plugins resolved to the same identity.
    #[error("duplicate source identity `{identity}`")]
    DuplicateIdentity { identity: Identity },

    /// A single source failed to start (for example, the port is already in use).
    #[error("source `{identity}` failed to start: {message}")]
    SourceStart {
        identity: Identity,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single source failed to stop cleanly.
    #[error("source `{identity}` failed to stop: {message}")]
    SourceStop {
        identity: Identity,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A lifecycle operation was invoked in a state that does not allow it.
    #[error("cannot {operation} input manager in state `{state}`")]
    InvalidState {
        operation: &'static str,
        state: ManagerState,
    },

    /// One or more sources failed during a lifecycle phase.
    #[error("{phase} failed for {} source(s): {}", .failed.len(), join_identities(.failed))]
    PartialFailure {
        phase: LifecyclePhase,
        failed: Vec<Identity>,
    },

    /// The inbound pipeline can no longer accept events.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FwddError {
    /// Build a `SourceStart` error wrapping an underlying cause.
    pub fn start_failed(
        identity: &Identity,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FwddError::SourceStart {
            identity: identity.clone(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a `SourceStop` error wrapping an underlying cause.
    pub fn stop_failed(
        identity: &Identity,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FwddError::SourceStop {
            identity: identity.clone(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

fn join_identities(ids: &[Identity]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
