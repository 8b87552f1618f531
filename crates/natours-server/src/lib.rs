#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod cors;
mod error_responder;
mod fallback;
pub mod guards;
mod health;
mod routes;
mod security_headers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use natours_config::Config;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error_responder::ErrorResponder;
pub use guards::{Exchange, Guard, GuardChain};
pub use routes::{Resource, RouteError, RouteGroups};
pub use security_headers::SecurityHeaders;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration and the application's route groups
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the rate limit
    /// store cannot be created
    pub fn new(config: &Config, groups: RouteGroups) -> anyhow::Result<Self> {
        config.validate()?;
        let server = &config.server;

        let listen_address = server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        tracing::debug!(groups = ?groups.mounted(), "registering route groups");
        let mut app = groups.into_router();

        // Health check
        if server.health.enabled {
            app = app.route(&server.health.path, axum::routing::get(health::health_handler));
        }

        // Static files, then 404; a path served under another method is a
        // miss too
        let static_files = server.static_dir.as_ref().map(ServeDir::new);
        let not_found = move |request: Request| {
            let static_files = static_files.clone();
            async move { fallback::not_found(static_files, request).await }
        };
        app = app.method_not_allowed_fallback(not_found.clone()).fallback(not_found);

        // Apply middleware layers (innermost first)

        // Guard chain
        let limiter = if server.rate_limit.enabled {
            Some(Arc::new(natours_ratelimit::create_request_limiter(&server.rate_limit)?))
        } else {
            None
        };
        let chain = Arc::new(GuardChain::from_config(server, limiter));
        tracing::debug!(guards = ?chain.names(), "guard chain assembled");
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let chain = Arc::clone(&chain);
            async move { guards::guard_chain_middleware(chain, req, next).await }
        }));

        // CORS
        if server.cors.enabled {
            app = app.layer(cors::cors_layer(&server.cors));
        }

        // Panics become defects for the error responder
        app = app.layer(CatchPanicLayer::custom(error_responder::panic_response));

        // Error rendering
        let responder = Arc::new(ErrorResponder::new(server.environment));
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let responder = Arc::clone(&responder);
            async move { error_responder::error_responder_middleware(responder, req, next).await }
        }));

        // Security headers, on every response including errors
        if server.security_headers.enabled {
            let headers = Arc::new(SecurityHeaders::from_config(&server.security_headers)?);
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let headers = Arc::clone(&headers);
                async move { security_headers::security_headers_middleware(headers, req, next).await }
            }));
        }

        // Request logging
        if server.environment.is_development() {
            app = app.layer(TraceLayer::new_for_http());
        }

        tracing::info!(environment = %server.environment, "server configured");

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

        Ok(())
    }
}
