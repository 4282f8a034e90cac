// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP input source: newline-delimited JSON events over any number of
//! concurrent connections.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use fwdd_config::PluginConfig;
use fwdd_core::{FwddError, HealthStatus, Identity, InboundPipeline, PluginType, Source};

use super::{backoff, bind_addr, forward, EventDefaults, Listener, ListenerSlot};
use crate::factory::{mismatched_config, PluginFactory};

/// Builds [`TcpSource`]s from `type = "tcp"` records.
pub struct TcpFactory;

impl PluginFactory for TcpFactory {
    fn plugin_type(&self) -> PluginType {
        PluginType::Tcp
    }

    fn build(
        &self,
        identity: Identity,
        config: &PluginConfig,
        pipeline: Arc<InboundPipeline>,
    ) -> Result<Arc<dyn Source>, FwddError> {
        let PluginConfig::Tcp(tcp) = config else {
            return Err(mismatched_config(PluginType::Tcp, &identity, config));
        };
        let bind = bind_addr(&identity, &tcp.host, tcp.port)?;
        if tcp.max_line_length == 0 {
            return Err(FwddError::Config(format!(
                "source `{identity}`: max_line_length must be greater than 0"
            )));
        }
        let defaults = EventDefaults {
            tags: tcp.tags.clone(),
            attributes: tcp.attributes.clone(),
        };
        Ok(Arc::new(TcpSource::new(
            identity,
            bind,
            tcp.max_line_length,
            defaults,
            pipeline,
        )))
    }
}

/// Accepts TCP connections and forwards one event per line.
pub struct TcpSource {
    identity: Identity,
    bind: SocketAddr,
    max_line_length: usize,
    defaults: Arc<EventDefaults>,
    pipeline: Arc<InboundPipeline>,
    listener: ListenerSlot,
}

impl TcpSource {
    pub(crate) fn new(
        identity: Identity,
        bind: SocketAddr,
        max_line_length: usize,
        defaults: EventDefaults,
        pipeline: Arc<InboundPipeline>,
    ) -> Self {
        Self {
            identity,
            bind,
            max_line_length,
            defaults: Arc::new(defaults),
            pipeline,
            listener: ListenerSlot::default(),
        }
    }
}

#[async_trait]
impl Source for TcpSource {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Tcp
    }

    fn pipeline(&self) -> &Arc<InboundPipeline> {
        &self.pipeline
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    async fn start(&self) -> Result<(), FwddError> {
        self.listener.ensure_idle(&self.identity)?;

        let listener = TcpListener::bind(self.bind).await.map_err(|e| {
            FwddError::start_failed(&self.identity, format!("failed to bind tcp {}", self.bind), e)
        })?;
        let local_addr = listener.local_addr().map_err(|e| {
            FwddError::start_failed(&self.identity, "failed to read bound tcp address", e)
        })?;

        let cancel = CancellationToken::new();
        let ctx = ConnectionContext {
            identity: self.identity.clone(),
            max_line_length: self.max_line_length,
            defaults: Arc::clone(&self.defaults),
            pipeline: Arc::clone(&self.pipeline),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(accept_loop(listener, ctx));

        info!(identity = %self.identity, addr = %local_addr, "tcp source listening");
        self.listener.install(Listener {
            cancel,
            handle,
            local_addr,
        });
        Ok(())
    }

    /// Stops accepting, then waits for every open connection to finish.
    async fn stop(&self) -> Result<(), FwddError> {
        self.listener.shutdown(&self.identity).await
    }

    async fn health_check(&self) -> HealthStatus {
        self.listener.health()
    }
}

#[derive(Clone)]
struct ConnectionContext {
    identity: Identity,
    max_line_length: usize,
    defaults: Arc<EventDefaults>,
    pipeline: Arc<InboundPipeline>,
    cancel: CancellationToken,
}

async fn accept_loop(listener: TcpListener, ctx: ConnectionContext) {
    let tracker = TaskTracker::new();

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(identity = %ctx.identity, peer = %peer, "tcp connection accepted");
                    tracker.spawn(handle_connection(stream, peer, ctx.clone()));
                }
                Err(e) => {
                    warn!(identity = %ctx.identity, error = %e, "tcp accept error");
                    if !backoff(&ctx.cancel).await {
                        break;
                    }
                }
            },
        }
    }

    drop(listener);
    tracker.close();
    tracker.wait().await;
    debug!(identity = %ctx.identity, "tcp accept loop exited");
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: ConnectionContext) {
    let mut lines = FramedRead::new(stream, LinesCodec::new_with_max_length(ctx.max_line_length));

    loop {
        let next = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            next = lines.next() => next,
        };

        let line = match next {
            None => break,
            Some(Ok(line)) => line,
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                warn!(
                    identity = %ctx.identity,
                    peer = %peer,
                    max_line_length = ctx.max_line_length,
                    "line too long, closing tcp connection"
                );
                break;
            }
            Some(Err(LinesCodecError::Io(e))) => {
                debug!(identity = %ctx.identity, peer = %peer, error = %e, "tcp read error");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str(line) {
            Ok(event) => {
                if !forward(&ctx.identity, &ctx.pipeline, &ctx.cancel, ctx.defaults.apply(event)).await {
                    break;
                }
            }
            Err(e) => {
                warn!(identity = %ctx.identity, peer = %peer, error = %e, "dropping malformed tcp event");
            }
        }
    }

    debug!(identity = %ctx.identity, peer = %peer, "tcp connection closed");
}
