//! HTTP adapter for an mlserve endpoint registry.
//!
//! The registry is built once, wrapped in an [`Arc`] and turned into an
//! [`axum::Router`] by [`router`]. Payload validation happens on the async
//! side; prediction functions run on tokio's blocking pool.
//!
//! ## Error responses
//!
//! - `400` with `{"status": "VALIDATION_ERROR", "code", "error", "details"}`
//!   when the payload does not match the schema
//! - `500` with `{"status": "SERVER_ERROR", ...}` when the prediction
//!   function fails or panics

mod config;
mod error;
mod router;


use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use mlserve_spec::EndpointRegistry;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use config::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT, HOST_ENV, PORT_ENV};
pub use error::{ApiError, ErrorResponse, SERVER_ERROR, VALIDATION_ERROR};
pub use router::router;

/// Run the HTTP server until Ctrl+C.
///
/// # Returns
/// Exit code: 0 on clean shutdown
pub fn run(config: &ServerConfig, registry: Arc<EndpointRegistry>) -> Result<ExitCode> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(serve(config, registry))?;
    Ok(ExitCode::SUCCESS)
}

/// Serve `registry` on the configured address (async entry point).
pub async fn serve(config: &ServerConfig, registry: Arc<EndpointRegistry>) -> Result<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local_addr = listener.local_addr().context("Failed to read local address")?;

    info!(
        address = %local_addr,
        endpoints = registry.endpoints().len(),
        "mlserve listening"
    );

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
