// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock input source for deterministic lifecycle tests.
//!
//! `MockSource` implements `Source` without any I/O. It can be scripted to
//! fail or panic on start, fail on stop, or emit a fixed batch of events into
//! its pipeline when started.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use fwdd_core::{Event, FwddError, HealthStatus, Identity, InboundPipeline, PluginType, Source};

/// Ordered record of lifecycle calls shared by several mock sources.
///
/// Entries look like `start:0` or `stop:2`.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: String) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }

    /// Snapshot of every call recorded so far, in call order.
    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Start and stop call counts of one mock source, readable after the source
/// has been moved into a registry.
#[derive(Debug, Clone, Default)]
pub struct MockCounters {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl MockCounters {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum StartBehavior {
    Succeed,
    Fail(String),
    Panic,
}

/// A scriptable source for testing the input manager.
pub struct MockSource {
    identity: Identity,
    plugin_type: PluginType,
    pipeline: Arc<InboundPipeline>,
    on_start: StartBehavior,
    stop_error: Option<String>,
    emit: Vec<Event>,
    log: Option<CallLog>,
    counters: MockCounters,
}

impl MockSource {
    /// A source that starts and stops successfully and emits nothing.
    pub fn new(identity: Identity, pipeline: Arc<InboundPipeline>) -> Self {
        Self {
            identity,
            plugin_type: PluginType::Udp,
            pipeline,
            on_start: StartBehavior::Succeed,
            stop_error: None,
            emit: Vec::new(),
            log: None,
            counters: MockCounters::default(),
        }
    }

    pub fn with_plugin_type(mut self, plugin_type: PluginType) -> Self {
        self.plugin_type = plugin_type;
        self
    }

    /// Record start and stop calls into `log`.
    pub fn with_call_log(mut self, log: &CallLog) -> Self {
        self.log = Some(log.clone());
        self
    }

    /// Make `start()` return a `SourceStart` error with `message`.
    pub fn failing_start(mut self, message: impl Into<String>) -> Self {
        self.on_start = StartBehavior::Fail(message.into());
        self
    }

    /// Make `start()` panic.
    pub fn panicking_start(mut self) -> Self {
        self.on_start = StartBehavior::Panic;
        self
    }

    /// Make `stop()` return a `SourceStop` error with `message`.
    pub fn failing_stop(mut self, message: impl Into<String>) -> Self {
        self.stop_error = Some(message.into());
        self
    }

    /// Submit `events` into the pipeline when started.
    pub fn emitting(mut self, events: Vec<Event>) -> Self {
        self.emit = events;
        self
    }

    /// Handle onto this source's call counters.
    pub fn counters(&self) -> MockCounters {
        self.counters.clone()
    }

    fn record(&self, call: &str) {
        if let Some(log) = &self.log {
            log.push(format!("{call}:{}", self.identity));
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn plugin_type(&self) -> PluginType {
        self.plugin_type
    }

    fn pipeline(&self) -> &Arc<InboundPipeline> {
        &self.pipeline
    }

    async fn start(&self) -> Result<(), FwddError> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        self.record("start");
        match &self.on_start {
            StartBehavior::Succeed => {}
            StartBehavior::Fail(message) => {
                return Err(FwddError::SourceStart {
                    identity: self.identity.clone(),
                    message: message.clone(),
                    source: None,
                });
            }
            StartBehavior::Panic => panic!("mock source `{}` panicked on start", self.identity),
        }
        for event in &self.emit {
            self.pipeline.submit(event.clone()).await?;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), FwddError> {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        self.record("stop");
        match &self.stop_error {
            Some(message) => Err(FwddError::SourceStop {
                identity: self.identity.clone(),
                message: message.clone(),
                source: None,
            }),
            None => Ok(()),
        }
    }

    async fn health_check(&self) -> HealthStatus {
        if self.counters.starts() > self.counters.stops() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy("not running".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn records_calls_in_order() {
        let pipeline = Arc::new(InboundPipeline::default());
        let log = CallLog::new();
        let a = MockSource::new(Identity::from("a"), Arc::clone(&pipeline)).with_call_log(&log);
        let b = MockSource::new(Identity::from("b"), pipeline).with_call_log(&log);

        a.start().await.unwrap();
        b.start().await.unwrap();
        b.stop().await.unwrap();

        assert_eq!(log.entries(), vec!["start:a", "start:b", "stop:b"]);
        assert_eq!(a.counters().starts(), 1);
        assert_eq!(a.counters().stops(), 0);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let pipeline = Arc::new(InboundPipeline::default());
        let source = MockSource::new(Identity::from("x"), pipeline)
            .failing_start("nope")
            .failing_stop("stuck");

        assert!(matches!(
            source.start().await.unwrap_err(),
            FwddError::SourceStart { message, .. } if message == "nope"
        ));
        assert!(matches!(
            source.stop().await.unwrap_err(),
            FwddError::SourceStop { message, .. } if message == "stuck"
        ));
    }

    #[tokio::test]
    async fn emits_events_on_start() {
        let pipeline = Arc::new(InboundPipeline::new(8));
        let mut rx = pipeline.take_receiver().unwrap();
        let source = MockSource::new(Identity::from("e"), Arc::clone(&pipeline))
            .emitting(vec![Event::new("a", 1.0), Event::new("b", 2.0)]);

        assert!(matches!(source.health_check().await, HealthStatus::Unhealthy(_)));
        source.start().await.unwrap();
        assert_eq!(source.health_check().await, HealthStatus::Healthy);

        let events = crate::recv_events(&mut rx, 2, Duration::from_secs(1)).await;
        let keys: Vec<&str> = events.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
