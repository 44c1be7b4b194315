//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for the read API
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener and shut down gracefully on Ctrl+C

use axum::body::Body;
use axum::http::Request;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::http::handlers::{self, ApiState};
use crate::http::request::{request_id_of, UuidRequestId};
use crate::jobs::sync::JobSynchronizer;
use crate::ledger::reader::LedgerReader;

/// Read-only JSON API over synchronized job views.
pub struct ApiServer {
    router: Router,
    config: ApiConfig,
}

impl ApiServer {
    pub fn new(config: ApiConfig, synchronizer: JobSynchronizer, ledger: Arc<dyn LedgerReader>) -> Self {
        let state = ApiState {
            synchronizer,
            ledger,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: ApiState) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/jobs", get(handlers::open_jobs))
            .route("/accounts/{account}/jobs", get(handlers::account_jobs))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id_of(request),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP API starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
