//! API server implementation.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind to.
    pub bind_address: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Headroom for multipart framing and metadata fields on top of the
/// evidence size ceiling.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Builds the application router with middleware applied.
///
/// The request body limit is sized from the evidence config; axum's
/// default would cut multipart uploads off at 2 MB before the evidence
/// manager's own size validation ever sees them.
pub fn build_app(state: AppState) -> Router {
    routes::health::init_start_time();
    let body_limit = state.evidence.max_upload_bytes() as usize + MULTIPART_OVERHEAD;
    routes::create_router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Runs the API server until shutdown is signalled.
pub async fn run_server(config: ApiServerConfig, state: AppState) -> std::io::Result<()> {
    let app = build_app(state);
    let listener = TcpListener::bind(config.bind_address).await?;
    info!(address = %config.bind_address, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
