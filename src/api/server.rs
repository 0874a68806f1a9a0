//! HTTP server lifecycle: bind, serve, shut down on SIGINT.

use std::net::SocketAddr;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Bind `addr` and serve the API until the process receives Ctrl-C.
pub async fn serve(ctx: ApiContext, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "HTTP server listening");

    axum::serve(listener, api_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Cannot listen for shutdown signal"),
    }
}
