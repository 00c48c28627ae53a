//! HTTP Server and Metrics Collection
//!
//! This module implements the Prometheus exporter HTTP server.
//!
//! # Architecture
//!
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/` endpoints
//! - **Collection**: pull-based; every scrape of `/metrics` runs one collection cycle
//!   against the Envoy, there is no background polling task
//! - **State Management**: only the Envoy client is shared, and it is cheap to clone
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - Liveness check, always 200 while the server is up
//!
//! # Error Handling
//!
//! A failed collection cycle answers the scrape with 503 and no metrics; Prometheus
//! records the target as down for that scrape. The server keeps running.

use crate::collectors;
use crate::config::Config;
use crate::envoy::EnvoyClient;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    client: EnvoyClient,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let retry = config.retry.policy()?;
    let client = EnvoyClient::new(&config.envoy, retry)?;

    let app = router(client);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

/// Build the exporter's router around an Envoy client
pub fn router(client: EnvoyClient) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { client })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>Envoy Exporter</title></head>
<body>
<h1>Enphase Envoy Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    let catalog = match collectors::collect(&state.client).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to collect metrics: {}", e);
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Error collecting metrics: {}", e),
            )
                .into_response();
        }
    };

    match catalog.render() {
        Ok(metrics) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            metrics,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
