//! Tessera Server - REST API for copy-detection-pattern authentication
//!
//! Exposes tessera-core functionality via HTTP endpoints:
//! - POST /products - Register a product and its master pattern
//! - GET  /products/{unique_id}/code - Download the printable code
//! - POST /verify - Verify a photographed code

use std::net::SocketAddr;

use anyhow::Context;
use tessera_server::{create_router_with_state, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_server=info,tessera_core=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();

    let state = AppState::from_config(&config)
        .await
        .context("failed to initialize application state")?;
    let app = create_router_with_state(state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        %addr,
        version = env!("CARGO_PKG_VERSION"),
        "Tessera API listening (docs at /swagger-ui)"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
