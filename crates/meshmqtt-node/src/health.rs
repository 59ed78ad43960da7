//! Health check HTTP server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use meshmqtt_relay::{SessionStatus, StatusSource};

/// Per-request timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sessions reported by the health endpoint
#[derive(Clone, Default)]
pub struct HealthState {
    relay: Option<Arc<dyn StatusSource>>,
    fanout: Option<Arc<dyn StatusSource>>,
}

impl HealthState {
    /// State reporting the relay session
    pub fn new(relay: Arc<dyn StatusSource>) -> Self {
        Self {
            relay: Some(relay),
            fanout: None,
        }
    }

    /// Also report the fan-out session
    pub fn with_fanout(mut self, fanout: Arc<dyn StatusSource>) -> Self {
        self.fanout = Some(fanout);
        self
    }

    /// Snapshot of every session
    pub fn report(&self) -> HealthReport {
        let relay = self.relay.as_ref().map(|s| s.status());
        let fanout = self.fanout.as_ref().map(|s| s.status());
        let status = relay.is_some_and(|s| s.status) && fanout.map_or(true, |s| s.status);
        HealthReport {
            relay,
            fanout,
            status,
        }
    }
}

/// Health endpoint body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Relay session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<SessionStatus>,
    /// Fan-out session, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fanout: Option<SessionStatus>,
    /// Every session healthy
    pub status: bool,
}

/// `200` when healthy, `503` otherwise
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.report();
    let code = if report.status {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

/// Create the health router
pub fn create_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Bind on all interfaces; port 0 picks a free port
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await
}

/// Serve until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    state: HealthState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Health check listening");
    }
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
