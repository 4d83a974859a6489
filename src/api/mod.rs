//! HTTP API server for the InHome gateway

pub mod devices;
pub mod error;
pub mod health;
pub mod policies;
pub mod revision;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::{DbPool, DeviceRegistry, PolicyRegistry, RevisionLog};
use crate::{Error, Result};

pub use error::ApiError;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub devices: DeviceRegistry,
    pub policies: PolicyRegistry,
    pub revisions: RevisionLog,
}

impl ApiState {
    /// Build registries over a shared pool
    #[must_use]
    pub fn new(db: DbPool) -> Self {
        Self {
            devices: DeviceRegistry::new(db.clone()),
            policies: PolicyRegistry::new(db.clone()),
            revisions: RevisionLog::new(db.clone()),
            db,
        }
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let router = Router::new()
        .nest("/v1/device-management", devices::router(state.clone()))
        .nest("/v1/policy-management", policies::router(state.clone()))
        .nest("/v1/revision", revision::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state));

    // CORS layer for cross-origin requests from the web front end
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    addr: SocketAddr,
}

impl ApiServer {
    /// Create a server for the given pool and listen address
    #[must_use]
    pub fn new(db: DbPool, addr: SocketAddr) -> Self {
        Self {
            state: Arc::new(ApiState::new(db)),
            addr,
        }
    }

    /// Run the API server until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server on {}: {e}", self.addr)))?;

        tracing::info!(addr = %self.addr, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
