// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The input manager: owns every configured source and the shared pipeline,
//! and drives their start and stop.
//!
//! Lifecycle is `Constructed -> Started -> Stopped`. Sources are started in
//! registry order and stopped in reverse. A failing (or panicking) source is
//! recorded in the returned [`LifecycleReport`] and never keeps the others
//! from being visited; whether a partial start is fatal is the caller's call.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use fwdd_config::InputConfig;
use fwdd_core::{FwddError, Identity, InboundPipeline, LifecyclePhase, ManagerState, Source};

use crate::factory::FactoryTable;
use crate::registry::{SourceEntry, SourceRegistry};
use crate::report::LifecycleReport;

/// Orchestrates the lifecycle of all configured sources.
pub struct InputManager {
    registry: SourceRegistry,
    pipeline: Arc<InboundPipeline>,
    state: ManagerState,
    /// Registry positions of sources whose start succeeded, in start order.
    started: Vec<usize>,
}

impl InputManager {
    /// Wrap an already built registry and the pipeline its sources were bound to.
    ///
    /// Fails if any source holds a different pipeline instance.
    pub fn new(
        registry: SourceRegistry,
        pipeline: Arc<InboundPipeline>,
    ) -> Result<Self, FwddError> {
        for entry in registry.iter() {
            if !Arc::ptr_eq(entry.source().pipeline(), &pipeline) {
                return Err(FwddError::Internal(format!(
                    "source `{}` is bound to a different inbound pipeline",
                    entry.identity()
                )));
            }
        }
        Ok(Self {
            registry,
            pipeline,
            state: ManagerState::Constructed,
            started: Vec::new(),
        })
    }

    /// Wire a manager from the input configuration.
    ///
    /// Creates the one pipeline, resolves each plugin's identity (its explicit
    /// `id`, else its position in the list), builds it with the matching
    /// factory and registers it. Configuration and duplicate identity errors
    /// are returned before any source is started.
    pub fn from_config(config: &InputConfig, factories: &FactoryTable) -> Result<Self, FwddError> {
        let pipeline = Arc::new(InboundPipeline::new(config.pipeline_capacity));
        let mut builder = SourceRegistry::builder();

        for (index, plugin) in config.plugins.iter().enumerate() {
            let identity = plugin
                .id()
                .map(Identity::from)
                .unwrap_or_else(|| Identity::ordinal(index));

            if builder.contains(&identity) {
                return Err(FwddError::DuplicateIdentity { identity });
            }

            let source = factories.build(identity.clone(), plugin, Arc::clone(&pipeline))?;
            debug!(
                identity = %identity,
                plugin = %plugin.plugin_type(),
                "input source built"
            );
            builder.register(identity, source)?;
        }

        let registry = builder.build();
        info!(sources = registry.len(), "input sources registered");
        Self::new(registry, pipeline)
    }

    /// Start every source in registry order.
    ///
    /// Returns `InvalidState` when called a second time or after `stop()`;
    /// callers should treat that as fatal. Otherwise returns the per-source
    /// report, leaving successfully started sources running even if others failed.
    pub async fn start(&mut self) -> Result<LifecycleReport, FwddError> {
        if self.state != ManagerState::Constructed {
            return Err(FwddError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }
        self.state = ManagerState::Started;

        info!(sources = self.registry.len(), "starting input sources");
        let mut report = LifecycleReport::new(LifecyclePhase::Start);

        for (index, entry) in self.registry.iter().enumerate() {
            let result = start_isolated(entry).await;
            match &result {
                Ok(()) => {
                    info!(
                        identity = %entry.identity(),
                        plugin = %entry.source().plugin_type(),
                        addr = ?entry.source().local_addr(),
                        "input source started"
                    );
                    self.started.push(index);
                }
                Err(e) => {
                    error!(identity = %entry.identity(), error = %e, "input source failed to start");
                }
            }
            report.record(entry.identity().clone(), result);
        }

        if report.is_success() {
            info!(started = self.started.len(), "all input sources started");
        } else {
            warn!(
                started = self.started.len(),
                failed = report.failed().len(),
                "input sources partially started"
            );
        }
        Ok(report)
    }

    /// Stop every started source in reverse start order.
    ///
    /// Each stop is best effort: a failure is recorded and the remaining
    /// sources are still stopped. The manager is `Stopped` afterwards
    /// regardless. Stopping a manager that never started stops nothing.
    /// A second call returns `InvalidState`.
    pub async fn stop(&mut self) -> Result<LifecycleReport, FwddError> {
        if self.state == ManagerState::Stopped {
            return Err(FwddError::InvalidState {
                operation: "stop",
                state: self.state,
            });
        }
        self.state = ManagerState::Stopped;

        info!(sources = self.started.len(), "stopping input sources");
        let mut report = LifecycleReport::new(LifecyclePhase::Stop);

        for index in std::mem::take(&mut self.started).into_iter().rev() {
            let entry = &self.registry.entries()[index];
            let result = stop_isolated(entry).await;
            match &result {
                Ok(()) => debug!(identity = %entry.identity(), "input source stopped"),
                Err(e) => {
                    warn!(identity = %entry.identity(), error = %e, "input source failed to stop");
                }
            }
            report.record(entry.identity().clone(), result);
        }

        info!(
            stopped = report.succeeded().len(),
            failed = report.failed().len(),
            "input sources stopped"
        );
        Ok(report)
    }

    /// Source handles in registry order.
    pub fn sources(&self) -> Vec<Arc<dyn Source>> {
        self.registry
            .iter()
            .map(|e| Arc::clone(e.source()))
            .collect()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// The pipeline every source submits into.
    pub fn pipeline(&self) -> &Arc<InboundPipeline> {
        &self.pipeline
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Identities of sources currently running under this manager.
    pub fn running(&self) -> Vec<&Identity> {
        self.started
            .iter()
            .map(|&i| self.registry.entries()[i].identity())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl std::fmt::Debug for InputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputManager")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

async fn start_isolated(entry: &SourceEntry) -> Result<(), FwddError> {
    let identity = entry.identity();
    match AssertUnwindSafe(entry.source().start()).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e @ FwddError::SourceStart { .. })) => Err(e),
        Ok(Err(other)) => Err(FwddError::SourceStart {
            identity: identity.clone(),
            message: other.to_string(),
            source: Some(Box::new(other)),
        }),
        Err(panic) => Err(FwddError::SourceStart {
            identity: identity.clone(),
            message: format!("start panicked: {}", panic_message(panic.as_ref())),
            source: None,
        }),
    }
}

async fn stop_isolated(entry: &SourceEntry) -> Result<(), FwddError> {
    let identity = entry.identity();
    match AssertUnwindSafe(entry.source().stop()).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e @ FwddError::SourceStop { .. })) => Err(e),
        Ok(Err(other)) => Err(FwddError::SourceStop {
            identity: identity.clone(),
            message: other.to_string(),
            source: Some(Box::new(other)),
        }),
        Err(panic) => Err(FwddError::SourceStop {
            identity: identity.clone(),
            message: format!("stop panicked: {}", panic_message(panic.as_ref())),
            source: None,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
