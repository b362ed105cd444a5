//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the outer axum Router that forwards to the live routes
//! - Wire up middleware (request id, tracing, timeout)
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - The outer router never changes; route publication happens behind it
//!   in [`LiveRoutes`], so re-registration needs no server restart
//! - Timeouts answer with the same JSON envelope as every other failure

use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::fault::Fault;
use crate::http::response::ResponseEnvelope;
use crate::registry::{dispatch, LiveRoutes};

/// HTTP server for an [`Api`](crate::registry::Api).
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that serves whatever `routes` currently publishes.
    pub fn new(config: &ServerConfig, routes: LiveRoutes) -> Self {
        Self {
            router: Self::build_router(config, routes),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, routes: LiveRoutes) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(routes)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::map_response(timeout_envelope))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// The timeout layer answers 408 with an empty body; give it the envelope.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT && !response.headers().contains_key(header::CONTENT_TYPE) {
        return ResponseEnvelope::from_fault(&Fault::status(StatusCode::REQUEST_TIMEOUT)).into_response();
    }
    response
}
