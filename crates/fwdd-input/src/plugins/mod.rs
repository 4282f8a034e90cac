// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in input sources and the plumbing they share.
//!
//! Each source binds its socket in `start()`, runs its loop in a spawned task
//! and keeps the task's cancellation token and join handle in a
//! [`ListenerSlot`] until `stop()` cancels and joins it.

pub mod decode;
pub mod http;
pub mod tcp;
pub mod udp;

use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use fwdd_core::{Event, FwddError, HealthStatus, Identity, InboundPipeline};

pub use http::{HttpFactory, HttpSource};
pub use tcp::{TcpFactory, TcpSource};
pub use udp::{UdpFactory, UdpSource};

/// Resolve a configured host and port into a bind address.
///
/// Accepts IP literals and `localhost`. Name resolution is not attempted.
pub(crate) fn bind_addr(identity: &Identity, host: &str, port: u16) -> Result<SocketAddr, FwddError> {
    let host = host.trim();
    let ip = if host.eq_ignore_ascii_case("localhost") {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        host.parse::<IpAddr>().map_err(|_| {
            FwddError::Config(format!(
                "source `{identity}`: host `{host}` is not an IP address or `localhost`"
            ))
        })?
    };
    Ok(SocketAddr::new(ip, port))
}

/// Tags and attributes a source adds to every event it receives.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventDefaults {
    pub tags: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
}

impl EventDefaults {
    pub fn apply(&self, event: Event) -> Event {
        if self.tags.is_empty() && self.attributes.is_empty() {
            event
        } else {
            event.with_defaults(&self.tags, &self.attributes)
        }
    }
}

/// Submit one event unless the source is being cancelled.
///
/// Returns `false` when the loop should exit: either cancellation won the
/// race or the pipeline consumer is gone.
pub(crate) async fn forward(
    identity: &Identity,
    pipeline: &InboundPipeline,
    cancel: &CancellationToken,
    event: Event,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        result = pipeline.submit(event) => match result {
            Ok(()) => true,
            Err(e) => {
                warn!(identity = %identity, error = %e, "pipeline closed, source loop exiting");
                false
            }
        },
    }
}

/// Pause after a socket error before retrying it.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Wait out [`ERROR_BACKOFF`] after a failed receive or accept.
///
/// Returns `false` if the source was cancelled while waiting.
pub(crate) async fn backoff(cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(ERROR_BACKOFF) => true,
    }
}

/// A running listener task.
pub(crate) struct Listener {
    pub cancel: CancellationToken,
    pub handle: JoinHandle<()>,
    pub local_addr: SocketAddr,
}

/// Holds the running listener of a source, if any.
#[derive(Default)]
pub(crate) struct ListenerSlot {
    inner: Mutex<Option<Listener>>,
}

impl ListenerSlot {
    fn lock(&self) -> MutexGuard<'_, Option<Listener>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fail if a listener is already running.
    pub fn ensure_idle(&self, identity: &Identity) -> Result<(), FwddError> {
        if self.lock().is_some() {
            return Err(FwddError::SourceStart {
                identity: identity.clone(),
                message: "source is already running".to_string(),
                source: None,
            });
        }
        Ok(())
    }

    pub fn install(&self, listener: Listener) {
        *self.lock() = Some(listener);
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock().as_ref().map(|l| l.local_addr)
    }

    pub fn health(&self) -> HealthStatus {
        if self.lock().is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy("not running".to_string())
        }
    }

    /// Cancel and join the listener task. Stopping an idle slot is a no-op.
    pub async fn shutdown(&self, identity: &Identity) -> Result<(), FwddError> {
        let listener = self.lock().take();
        let Some(listener) = listener else {
            return Ok(());
        };
        listener.cancel.cancel();
        listener
            .handle
            .await
            .map_err(|e| FwddError::stop_failed(identity, "listener task did not exit cleanly", e))
    }
}
