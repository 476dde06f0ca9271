// ABOUTME: Helpers shared by the route modules
// ABOUTME: Token authentication, absolute request URLs, pagination and path id parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::{AUTHORIZATION, HOST};
use axum::http::{HeaderMap, Uri};
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::pagination::PageRequest;
use foodgram_core::validation::ValidationErrors;
use serde::de::DeserializeOwned;
use serde_json::{from_slice, Map, Value};
use tracing::debug;
use url::Url;

use crate::auth::{extract_token, AuthenticatedUser};
use crate::resources::ServerResources;

/// Resolve the caller; anonymous requests are rejected
///
/// # Errors
///
/// Returns `AuthRequired` without credentials, `AuthInvalid` for a bad token
pub async fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<AuthenticatedUser> {
    optional_auth(headers, resources)
        .await?
        .ok_or_else(AppError::auth_required)
}

/// Resolve the caller if an `Authorization` header is present
///
/// A present but invalid token is still an error.
///
/// # Errors
///
/// Returns `AuthInvalid` if the header is malformed or the token is rejected
pub async fn optional_auth(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<Option<AuthenticatedUser>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(extract_token)
        .ok_or_else(|| AppError::auth_invalid("Invalid token header."))?;

    resources
        .auth_manager
        .authenticate_token(&resources.database, token)
        .await
        .map(Some)
}

/// Scheme and authority used for absolute links
///
/// `PUBLIC_BASE_URL` wins; otherwise the request's `Host` header is used.
#[must_use]
pub fn base_url(headers: &HeaderMap, resources: &ServerResources) -> String {
    if let Some(base) = &resources.config.http.public_base_url {
        return base.clone();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");
    format!("http://{host}")
}

/// Absolute URL of the current request, used for pagination links
///
/// # Errors
///
/// Returns an internal error if the URL cannot be assembled
pub fn request_url(headers: &HeaderMap, resources: &ServerResources, uri: &Uri) -> AppResult<Url> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let raw = format!("{}{path_and_query}", base_url(headers, resources));
    Url::parse(&raw).map_err(|e| AppError::internal(format!("Invalid request URL '{raw}': {e}")))
}

/// Parse `page`/`limit` with the configured defaults
///
/// # Errors
///
/// Returns a field error if either value is not a positive integer
pub fn page_request(
    resources: &ServerResources,
    page: Option<&str>,
    limit: Option<&str>,
) -> AppResult<PageRequest> {
    let pagination = &resources.config.pagination;
    PageRequest::parse(page, limit, pagination.page_size, pagination.max_page_size)
}

/// Parse a numeric path id; anything else cannot name an object
///
/// # Errors
///
/// Returns `ResourceNotFound` naming `resource`
pub fn parse_id(raw: &str, resource: &str) -> AppResult<i64> {
    raw.parse().map_err(|_| AppError::not_found(resource))
}

/// Decode a JSON request body
///
/// Handlers call this after their auth and ownership checks so a bad body
/// never hides a 401/403/404. An empty body reads as `{}`, leaving missing
/// fields to validation. A value of the wrong type is reported against the
/// top-level field that holds it.
///
/// # Errors
///
/// Returns `InvalidInput` for malformed JSON, a body that is not an object,
/// or fields of the wrong type
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    let value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        from_slice::<Value>(body).map_err(|e| {
            debug!(error = %e, "Malformed JSON request body");
            AppError::invalid_input(format!("JSON parse error - {e}"))
        })?
    };
    let Value::Object(fields) = &value else {
        return Err(AppError::invalid_input("Invalid data. Expected a dictionary."));
    };

    match T::deserialize(&value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            let mut errors = ValidationErrors::new();
            for (key, field_value) in fields {
                let single = Value::Object(Map::from_iter([(key.clone(), field_value.clone())]));
                if let Err(field_error) = T::deserialize(&single) {
                    errors.add(key, format!("Incorrect value ({field_error})."));
                }
            }
            errors.into_result()?;
            Err(AppError::invalid_input(format!("Invalid data - {e}")))
        }
    }
}
