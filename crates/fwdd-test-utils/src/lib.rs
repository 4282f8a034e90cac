// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for fwdd integration tests.
//!
//! # Components
//!
//! - [`MockSource`] - Scriptable source that records its lifecycle calls
//! - [`CallLog`] - Shared, ordered record of start and stop calls
//! - [`recv_events`] - Drain a pipeline receiver with a timeout

pub mod mock_source;

use std::time::Duration;

use fwdd_core::Event;
use tokio::sync::mpsc;

pub use mock_source::{CallLog, MockCounters, MockSource};

/// Receive exactly `count` events, or fewer if `timeout` elapses first.
pub async fn recv_events(
    rx: &mut mpsc::Receiver<Event>,
    count: usize,
    timeout: Duration,
) -> Vec<Event> {
    let mut events = Vec::with_capacity(count);
    let deadline = tokio::time::Instant::now() + timeout;
    while events.len() < count {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => events.push(event),
            Ok(None) | Err(_) => break,
        }
    }
    events
}
