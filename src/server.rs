// ABOUTME: HTTP server assembly and lifecycle
// ABOUTME: Merges route modules, applies middleware layers, serves media, and shuts down gracefully
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! # HTTP Server
//!
//! [`build_router`] is the complete application; the integration tests drive
//! it directly while [`FoodgramServer::run`] binds it to a socket.

use std::future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use foodgram_core::errors::{AppError, ErrorCode};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::middleware::{setup_cors, MakeRequestUuid, RecordResponse, RequestSpan, REQUEST_ID_HEADER};
use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, HealthRoutes, IngredientRoutes, RecipeRoutes, ShortLinkRoutes, TagRoutes,
    UserRoutes,
};

/// Method and path of every API endpoint, for the startup listing
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("GET", "/health"),
    ("POST", "/api/auth/token/login/"),
    ("POST", "/api/auth/token/logout/"),
    ("GET, POST", "/api/users/"),
    ("GET", "/api/users/{id}/"),
    ("GET", "/api/users/me/"),
    ("PUT, DELETE", "/api/users/me/avatar/"),
    ("POST", "/api/users/set_password/"),
    ("GET", "/api/users/subscriptions/"),
    ("POST, DELETE", "/api/users/{id}/subscribe/"),
    ("GET", "/api/tags/"),
    ("GET", "/api/tags/{id}/"),
    ("GET", "/api/ingredients/"),
    ("GET", "/api/ingredients/{id}/"),
    ("GET, POST", "/api/recipes/"),
    ("GET, PATCH, DELETE", "/api/recipes/{id}/"),
    ("GET", "/api/recipes/{id}/get-link/"),
    ("POST, DELETE", "/api/recipes/{id}/favorite/"),
    ("POST, DELETE", "/api/recipes/{id}/shopping_cart/"),
    ("GET", "/api/recipes/download_shopping_cart/"),
    ("GET", "/s/{code}/"),
];

/// Build the application router with every route and middleware layer
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let http = &resources.config.http;

    let mut router = Router::new()
        .merge(HealthRoutes::routes())
        .merge(AuthRoutes::routes(Arc::clone(resources)))
        .merge(UserRoutes::routes(Arc::clone(resources)))
        .merge(TagRoutes::routes(Arc::clone(resources)))
        .merge(IngredientRoutes::routes(Arc::clone(resources)))
        .merge(RecipeRoutes::routes(Arc::clone(resources)))
        .merge(ShortLinkRoutes::routes(Arc::clone(resources)))
        .fallback(handle_not_found);

    let media_prefix = resources.media.url_prefix().trim_end_matches('/');
    if media_prefix.starts_with('/') && media_prefix.len() > 1 {
        router = router.nest_service(media_prefix, ServeDir::new(resources.media.root()));
    } else {
        warn!(prefix = %resources.media.url_prefix(), "MEDIA_URL is not a local path; media is not served");
    }

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(RequestSpan)
                    .on_response(RecordResponse),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(setup_cors(http))
            .layer(TimeoutLayer::new(http.request_timeout))
            .layer(DefaultBodyLimit::max(http.max_body_bytes)),
    )
}

async fn handle_not_found() -> AppError {
    AppError::new(ErrorCode::ResourceNotFound, "Not found.")
}

/// Foodgram HTTP server
pub struct FoodgramServer {
    resources: Arc<ServerResources>,
}

impl FoodgramServer {
    /// Create a server around shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// The application router
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails
    pub async fn run(self) -> Result<()> {
        let http = &self.resources.config.http;
        let address = format!("{}:{}", http.host, http.port);

        match self.resources.database.purge_expired_tokens().await {
            Ok(purged) if purged > 0 => info!(purged, "Removed expired auth tokens"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge expired auth tokens"),
        }

        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;
        info!(address = %address, "HTTP server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
