// ABOUTME: Health check route handler for service monitoring
// ABOUTME: Reports service name and version for load balancers and probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use axum::{routing::get, Json, Router};
use foodgram_core::constants::service_names;
use serde::{Deserialize, Serialize};

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: String,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
}

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health check route
    pub fn routes() -> Router {
        async fn health_handler() -> Json<HealthResponse> {
            Json(HealthResponse {
                status: "ok".to_owned(),
                service: service_names::FOODGRAM_SERVER.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            })
        }

        Router::new().route("/health", get(health_handler))
    }
}
