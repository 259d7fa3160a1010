use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::error::Result;
use crate::extractor::ExtractorTrait;

/// Bind the configured address and serve until shutdown is signalled
pub async fn run_server(config: &Config, extractor: Arc<dyn ExtractorTrait>) -> Result<()> {
    // A missing tool must not take liveness down with it
    match extractor.get_version_info().await {
        Ok(version) => info!("Extraction tool {} version {}", config.extractor.binary_path, version),
        Err(e) => warn!("Extraction tool {} is not usable: {}", config.extractor.binary_path, e),
    }

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Server listening on port {} ({})", config.server.port, listener.local_addr()?);

    serve(listener, AppState::new(config, extractor)).await
}

/// Serve the relay on an already bound listener
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
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
