// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UDP input source: newline-separated JSON events per datagram.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fwdd_config::PluginConfig;
use fwdd_core::{FwddError, HealthStatus, Identity, InboundPipeline, PluginType, Source};

use super::{backoff, bind_addr, decode, forward, EventDefaults, Listener, ListenerSlot};
use crate::factory::{mismatched_config, PluginFactory};

/// Largest payload a UDP datagram can carry over IPv4.
const MAX_UDP_PAYLOAD: usize = 65507;

/// Builds [`UdpSource`]s from `type = "udp"` records.
pub struct UdpFactory;

impl PluginFactory for UdpFactory {
    fn plugin_type(&self) -> PluginType {
        PluginType::Udp
    }

    fn build(
        &self,
        identity: Identity,
        config: &PluginConfig,
        pipeline: Arc<InboundPipeline>,
    ) -> Result<Arc<dyn Source>, FwddError> {
        let PluginConfig::Udp(udp) = config else {
            return Err(mismatched_config(PluginType::Udp, &identity, config));
        };
        let bind = bind_addr(&identity, &udp.host, udp.port)?;
        if udp.max_datagram_size == 0 || udp.max_datagram_size > MAX_UDP_PAYLOAD {
            return Err(FwddError::Config(format!(
                "source `{identity}`: max_datagram_size must be between 1 and {MAX_UDP_PAYLOAD}, got {}",
                udp.max_datagram_size
            )));
        }
        let defaults = EventDefaults {
            tags: udp.tags.clone(),
            attributes: udp.attributes.clone(),
        };
        Ok(Arc::new(UdpSource::new(
            identity,
            bind,
            udp.max_datagram_size,
            defaults,
            pipeline,
        )))
    }
}

/// Listens on a UDP socket and forwards every decoded event to the pipeline.
pub struct UdpSource {
    identity: Identity,
    bind: SocketAddr,
    max_datagram_size: usize,
    defaults: Arc<EventDefaults>,
    pipeline: Arc<InboundPipeline>,
    listener: ListenerSlot,
}

impl UdpSource {
    pub(crate) fn new(
        identity: Identity,
        bind: SocketAddr,
        max_datagram_size: usize,
        defaults: EventDefaults,
        pipeline: Arc<InboundPipeline>,
    ) -> Self {
        Self {
            identity,
            bind,
            max_datagram_size,
            defaults: Arc::new(defaults),
            pipeline,
            listener: ListenerSlot::default(),
        }
    }
}

#[async_trait]
impl Source for UdpSource {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Udp
    }

    fn pipeline(&self) -> &Arc<InboundPipeline> {
        &self.pipeline
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    async fn start(&self) -> Result<(), FwddError> {
        self.listener.ensure_idle(&self.identity)?;

        let socket = UdpSocket::bind(self.bind).await.map_err(|e| {
            FwddError::start_failed(&self.identity, format!("failed to bind udp {}", self.bind), e)
        })?;
        let local_addr = socket.local_addr().map_err(|e| {
            FwddError::start_failed(&self.identity, "failed to read bound udp address", e)
        })?;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(receive_loop(
            socket,
            self.identity.clone(),
            self.max_datagram_size,
            Arc::clone(&self.defaults),
            Arc::clone(&self.pipeline),
            cancel.clone(),
        ));

        info!(identity = %self.identity, addr = %local_addr, "udp source listening");
        self.listener.install(Listener {
            cancel,
            handle,
            local_addr,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), FwddError> {
        self.listener.shutdown(&self.identity).await
    }

    async fn health_check(&self) -> HealthStatus {
        self.listener.health()
    }
}

async fn receive_loop(
    socket: UdpSocket,
    identity: Identity,
    max_datagram_size: usize,
    defaults: Arc<EventDefaults>,
    pipeline: Arc<InboundPipeline>,
    cancel: CancellationToken,
) {
    // One spare byte so an oversized datagram is detected instead of truncated.
    let mut buf = vec![0u8; max_datagram_size + 1];

    'recv: loop {
        let (len, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok(received) => received,
                Err(e) => {
                    warn!(identity = %identity, error = %e, "udp receive error");
                    if !backoff(&cancel).await {
                        break;
                    }
                    continue;
                }
            },
        };

        if len > max_datagram_size {
            warn!(
                identity = %identity,
                peer = %peer,
                len,
                max_datagram_size,
                "dropping oversized udp datagram"
            );
            continue;
        }

        for decoded in decode::decode_lines(&buf[..len]) {
            match decoded {
                Ok(event) => {
                    if !forward(&identity, &pipeline, &cancel, defaults.apply(event)).await {
                        break 'recv;
                    }
                }
                Err(e) => {
                    warn!(identity = %identity, peer = %peer, error = %e, "dropping malformed udp event");
                }
            }
        }
    }

    debug!(identity = %identity, "udp receive loop exited");
}
