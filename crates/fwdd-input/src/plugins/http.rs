// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP input source built on axum.
//!
//! Routes:
//! - `POST {path}`: one JSON event or an array of events, answered with `202`
//! - `GET /health`: liveness probe

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use fwdd_config::PluginConfig;
use fwdd_core::{FwddError, HealthStatus, Identity, InboundPipeline, PluginType, Source};

use super::{bind_addr, decode, forward, EventDefaults, Listener, ListenerSlot};
use crate::factory::{mismatched_config, PluginFactory};

/// Route reserved for the liveness probe.
const HEALTH_PATH: &str = "/health";

/// Builds [`HttpSource`]s from `type = "http"` records.
pub struct HttpFactory;

impl PluginFactory for HttpFactory {
    fn plugin_type(&self) -> PluginType {
        PluginType::Http
    }

    fn build(
        &self,
        identity: Identity,
        config: &PluginConfig,
        pipeline: Arc<InboundPipeline>,
    ) -> Result<Arc<dyn Source>, FwddError> {
        let PluginConfig::Http(http) = config else {
            return Err(mismatched_config(PluginType::Http, &identity, config));
        };
        let bind = bind_addr(&identity, &http.host, http.port)?;
        validate_path(&identity, &http.path)?;
        let defaults = EventDefaults {
            tags: http.tags.clone(),
            attributes: http.attributes.clone(),
        };
        Ok(Arc::new(HttpSource::new(
            identity,
            bind,
            http.path.clone(),
            defaults,
            pipeline,
        )))
    }
}

/// The ingest route must be a plain static path that does not shadow `/health`.
fn validate_path(identity: &Identity, path: &str) -> Result<(), FwddError> {
    let problem = if !path.starts_with('/') {
        Some("must start with `/`")
    } else if path == HEALTH_PATH {
        Some("is reserved for the health probe")
    } else if path.contains(['{', '}', '*', ':']) {
        Some("must not contain route parameters or wildcards")
    } else {
        None
    };
    match problem {
        Some(problem) => Err(FwddError::Config(format!(
            "source `{identity}`: http path `{path}` {problem}"
        ))),
        None => Ok(()),
    }
}

/// Serves the ingest route and forwards posted events to the pipeline.
pub struct HttpSource {
    identity: Identity,
    bind: SocketAddr,
    path: String,
    defaults: Arc<EventDefaults>,
    pipeline: Arc<InboundPipeline>,
    listener: ListenerSlot,
}

impl HttpSource {
    pub(crate) fn new(
        identity: Identity,
        bind: SocketAddr,
        path: String,
        defaults: EventDefaults,
        pipeline: Arc<InboundPipeline>,
    ) -> Self {
        Self {
            identity,
            bind,
            path,
            defaults: Arc::new(defaults),
            pipeline,
            listener: ListenerSlot::default(),
        }
    }

    /// Route events are posted to.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Shared state handed to the ingest handler.
#[derive(Clone)]
struct IngestState {
    identity: Identity,
    defaults: Arc<EventDefaults>,
    pipeline: Arc<InboundPipeline>,
    cancel: CancellationToken,
}

#[derive(Debug, Serialize)]
struct AcceptedResponse {
    accepted: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

async fn post_events(State(state): State<IngestState>, body: Bytes) -> Response {
    let events = match decode::decode_batch(&body) {
        Ok(events) => events,
        Err(e) => {
            warn!(identity = %state.identity, error = %e, "rejecting malformed http payload");
            return error_response(StatusCode::BAD_REQUEST, format!("invalid event payload: {e}"));
        }
    };

    let mut accepted = 0;
    for event in events {
        if !forward(&state.identity, &state.pipeline, &state.cancel, state.defaults.apply(event)).await {
            warn!(identity = %state.identity, accepted, "http source cannot accept more events");
            return error_response(StatusCode::SERVICE_UNAVAILABLE, "input pipeline unavailable");
        }
        accepted += 1;
    }

    (StatusCode::ACCEPTED, Json(AcceptedResponse { accepted })).into_response()
}

async fn get_health() -> StatusCode {
    StatusCode::OK
}

fn router(path: &str, state: IngestState) -> Router {
    Router::new()
        .route(path, post(post_events))
        .route(HEALTH_PATH, get(get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[async_trait]
impl Source for HttpSource {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn plugin_type(&self) -> PluginType {
        PluginType::Http
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
            FwddError::start_failed(&self.identity, format!("failed to bind http {}", self.bind), e)
        })?;
        let local_addr = listener.local_addr().map_err(|e| {
            FwddError::start_failed(&self.identity, "failed to read bound http address", e)
        })?;

        let cancel = CancellationToken::new();
        let app = router(
            &self.path,
            IngestState {
                identity: self.identity.clone(),
                defaults: Arc::clone(&self.defaults),
                pipeline: Arc::clone(&self.pipeline),
                cancel: cancel.clone(),
            },
        );

        let identity = self.identity.clone();
        let shutdown = cancel.clone();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = result {
                warn!(identity = %identity, error = %e, "http server exited with error");
            }
            debug!(identity = %identity, "http server exited");
        });

        info!(identity = %self.identity, addr = %local_addr, path = %self.path, "http source listening");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_accepted() {
        let id = Identity::ordinal(0);
        assert!(validate_path(&id, "/v1/events").is_ok());
        assert!(validate_path(&id, "/").is_ok());
        assert!(validate_path(&id, "/healthz").is_ok());
    }

    #[test]
    fn parameterized_paths_are_rejected() {
        let id = Identity::ordinal(2);
        for path in ["/v1/{id}", "/v1/*rest", "/v1/:id"] {
            let err = validate_path(&id, path).unwrap_err();
            assert!(matches!(err, FwddError::Config(msg) if msg.contains("route parameters")));
        }
    }

    #[test]
    fn health_path_is_reserved() {
        let err = validate_path(&Identity::ordinal(0), "/health").unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }
}
