// ABOUTME: Unified error handling with standard error codes and HTTP response formatting
// ABOUTME: Defines AppError, ErrorCode, and the JSON error body returned to API clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! # Unified Error Handling System
//!
//! Every fallible operation in the server returns [`AppResult`]. An
//! [`AppError`] carries an [`ErrorCode`] (which decides the HTTP status),
//! a human readable message, and optional per-field validation messages.
//!
//! The JSON body sent to clients looks like:
//!
//! ```json
//! {"detail": "Invalid input", "code": "INVALID_INPUT", "tags": ["This field is required."]}
//! ```

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Standard error codes used throughout the application
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication & Authorization
    /// No credentials were supplied
    AuthRequired,
    /// Credentials were supplied but are not valid
    AuthInvalid,
    /// Authenticated, but not allowed to touch this resource
    PermissionDenied,

    // Validation
    /// Generic invalid input
    InvalidInput,
    /// The operation would break a uniqueness rule (duplicate follow, favorite, email...)
    ResourceAlreadyExists,

    // Resource Management
    /// Resource does not exist
    ResourceNotFound,

    // Internal
    /// Server misconfiguration
    ConfigError,
    /// Unexpected internal failure
    InternalError,
    /// Database operation failed
    DatabaseError,
    /// Media storage operation failed
    StorageError,
    /// Serialization or deserialization failed
    SerializationError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            // Uniqueness violations are reported as plain client errors, the way the
            // web client expects them.
            Self::InvalidInput | Self::ResourceAlreadyExists => 400,

            Self::AuthRequired | Self::AuthInvalid => 401,

            Self::PermissionDenied => 403,

            Self::ResourceNotFound => 404,

            Self::ConfigError
            | Self::InternalError
            | Self::DatabaseError
            | Self::StorageError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication credentials were not provided",
            Self::AuthInvalid => "Invalid token",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::InvalidInput => "The provided input is invalid",
            Self::ResourceAlreadyExists => "The resource already exists",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::StorageError => "Storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether the error is the server's fault
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Per-field validation messages, keyed by request field name
    pub field_errors: BTreeMap<String, Vec<String>>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field_errors: BTreeMap::new(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach a validation message to a single field
    #[must_use]
    pub fn with_field(mut self, field: &str, message: impl Into<String>) -> Self {
        self.field_errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(
            ErrorCode::AuthRequired,
            ErrorCode::AuthRequired.description(),
        )
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Permission denied
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input without a specific field
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Invalid input attributed to one request field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::InvalidInput, message.clone()).with_field(field, message)
    }

    /// Collected validation errors
    #[must_use]
    pub fn validation(errors: ValidationErrors) -> Self {
        let mut error = Self::new(ErrorCode::InvalidInput, "Validation failed");
        error.field_errors = errors.into_fields();
        error
    }

    /// Uniqueness rule violated
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceAlreadyExists, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Media storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Summary message
    pub detail: String,
    /// Machine readable code
    pub code: ErrorCode,
    /// Field errors, flattened next to `detail`
    #[serde(flatten)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        // Internal messages may carry SQL or filesystem details; clients get the
        // generic description instead.
        let detail = if error.code.is_server_error() {
            error.code.description().to_owned()
        } else {
            error.message
        };
        Self {
            detail,
            code: error.code,
            fields: error.field_errors,
        }
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use http::StatusCode;

    use super::{AppError, ErrorResponse};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                tracing::error!(code = ?self.code, error = %self, "Request failed");
            } else {
                tracing::debug!(code = ?self.code, error = %self, "Request rejected");
            }

            (status, Json(ErrorResponse::from(self))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ResourceAlreadyExists.http_status(), 400);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_field_errors_flatten_into_body() {
        let error = AppError::invalid_field("tags", "This field is required.");
        let json = serde_json::to_value(ErrorResponse::from(error)).unwrap();

        assert_eq!(json["code"], "INVALID_INPUT");
        assert_eq!(json["tags"][0], "This field is required.");
        assert_eq!(json["detail"], "This field is required.");
    }

    #[test]
    fn test_server_error_detail_is_generic() {
        let error = AppError::database("UNIQUE constraint failed: users.email");
        let response = ErrorResponse::from(error);

        assert_eq!(response.detail, "Database operation failed");
        assert!(response.fields.is_empty());
    }
}
