//! HTTP server for the Prometheus endpoint and the latest snapshot.

use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::worker::TelemetryService;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 9090).into(),
        }
    }
}

impl MetricsServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], port).into(),
        }
    }
}

/// Shared state for the metrics server.
pub struct MetricsState {
    registry: MetricsRegistry,
    service: TelemetryService,
}

impl MetricsState {
    /// Refreshes the registry from the service's current state.
    pub fn refresh(&self) {
        let latest = self.service.latest();
        let snapshot = MetricsSnapshot::from_components(
            latest.as_deref(),
            &self.service.stats(),
            self.service.publisher().published_count(),
        );
        self.registry.update(&snapshot);
    }
}

/// HTTP server exposing `/metrics`, `/snapshot` and `/health`.
///
/// The server only reads the service; it does not acquire it, so scraping
/// never keeps the camera running.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<MetricsState>,
}

impl MetricsServer {
    /// Creates a new metrics server.
    pub fn new(
        config: MetricsServerConfig,
        registry: MetricsRegistry,
        service: TelemetryService,
    ) -> Self {
        Self {
            config,
            state: Arc::new(MetricsState { registry, service }),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> Arc<MetricsState> {
        Arc::clone(&self.state)
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/snapshot", get(snapshot_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.state))
    }

    /// Starts the HTTP server.
    ///
    /// This method runs the server until it is shut down.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

/// Handler for the /metrics endpoint.
async fn metrics_handler(State(state): State<Arc<MetricsState>>) -> impl IntoResponse {
    state.refresh();

    match state.registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Handler for the /snapshot endpoint.
async fn snapshot_handler(State(state): State<Arc<MetricsState>>) -> Response {
    match state.service.latest() {
        Some(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        None => (StatusCode::NO_CONTENT, "").into_response(),
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::TrackerConfig;
    use crate::worker::SyntheticBackend;

    #[test]
    fn test_config_default() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9090);
    }

    #[test]
    fn test_config_with_port() {
        let config = MetricsServerConfig::with_port(8080);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_refresh_does_not_acquire() {
        let service =
            TelemetryService::new(TrackerConfig::default(), Arc::new(SyntheticBackend::default()));
        let server = MetricsServer::new(
            MetricsServerConfig::default(),
            MetricsRegistry::new().unwrap(),
            service.clone(),
        );

        server.state().refresh();
        assert_eq!(service.stats().refcount, 0);
        let output = server.state().registry.encode().unwrap();
        assert!(output.contains("face_telemetry_worker_running 0"));
    }
}
