//! HTTP server loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use simpletax_config::{ApiKeyTenantResolver, InMemoryCustomFieldStore};
use simpletax_telemetry::{log_listening, log_shutdown};
use tokio::net::TcpListener;

use crate::api::{create_router, AppState};

/// Server configuration.
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub tenants: ApiKeyTenantResolver,
    pub max_body_size: usize,
}

/// Run the server with an in-memory custom field store until Ctrl-C.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryCustomFieldStore::new());
    let state = AppState::new(store, Arc::new(config.tenants))
        .with_max_body_size(config.max_body_size);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    serve(listener, create_router(state), shutdown_signal()).await?;
    log_shutdown!("server stopped");
    Ok(())
}

/// Serve `app` on an already bound listener until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    log_listening!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
