// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single inbound pipeline that every source forwards decoded events into.
//!
//! One `InboundPipeline` is created per input manager and handed to every
//! source as the same `Arc`. Submissions from one source are delivered in the
//! order that source issued them; there is no ordering across sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::error::FwddError;
use crate::types::Event;

/// Default number of events buffered before `submit` applies backpressure.
pub const DEFAULT_PIPELINE_CAPACITY: usize = 4096;

/// Shared sink for decoded events.
///
/// Backed by a bounded mpsc channel. The consumer half is handed out once via
/// [`take_receiver`](Self::take_receiver) to whatever forwards events downstream.
pub struct InboundPipeline {
    tx: mpsc::Sender<Event>,
    rx: Mutex<Option<mpsc::Receiver<Event>>>,
    submitted: AtomicU64,
}

impl InboundPipeline {
    /// Create a pipeline buffering up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            submitted: AtomicU64::new(0),
        }
    }

    /// Submit one event, waiting for buffer space if the pipeline is full.
    ///
    /// Fails once the consumer half has been dropped.
    pub async fn submit(&self, event: Event) -> Result<(), FwddError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| FwddError::Pipeline("inbound pipeline consumer is closed".to_string()))?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("fwdd_input_events_total").increment(1);
        Ok(())
    }

    /// Take the consumer half. Returns `None` after the first call.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<Event>> {
        match self.rx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Total number of events accepted so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Maximum number of buffered events.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl Default for InboundPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_PIPELINE_CAPACITY)
    }
}

impl std::fmt::Debug for InboundPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundPipeline")
            .field("capacity", &self.capacity())
            .field("submitted", &self.submitted())
            .finish()
    }
}
