use std::sync::Arc;

use tokio::net::TcpListener;

use crate::bootstrap::build_service;
use crate::config::QuillConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// The Quill submission server.
pub struct QuillServer {
    config: QuillConfig,
    state: AppState,
}

impl QuillServer {
    pub fn new(config: QuillConfig) -> ServerResult<Self> {
        let state = AppState {
            service: Arc::new(build_service(&config)?),
            site_url: config.site_url(),
        };
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &QuillConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.server.bind_addr).await?;
        tracing::info!("Quill server listening on {}", self.config.server.bind_addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

/// Resolves once `signal` fires. A signal that cannot be registered never
/// resolves, so the server keeps running.
async fn shutdown_on<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
