// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Provides Cross-Origin Resource Sharing setup for the web frontend
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Foodgram Contributors

use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::HttpConfig;

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// An empty list or `*` allows any origin; otherwise only the listed
/// origins are accepted. Unparsable entries are skipped.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://foodgram.example.com,https://admin.example.com"
/// ```
#[must_use]
pub fn setup_cors(config: &HttpConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let wildcard = config.cors_allowed_origins.is_empty()
        || config.cors_allowed_origins.iter().any(|o| o == "*");
    let allow_origin = if wildcard || origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .expose_headers([
            HeaderName::from_static("content-disposition"),
            HeaderName::from_static("x-request-id"),
        ])
}
