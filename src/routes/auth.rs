// ABOUTME: Token login and logout route handlers
// ABOUTME: Exchanges email and password for an auth token and revokes it on logout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! Authentication routes
//!
//! Clients send the issued token back as `Authorization: Token <token>`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use foodgram_core::constants::auth::INVALID_CREDENTIALS;
use foodgram_core::errors::AppError;
use foodgram_core::validation::{ValidationErrors, REQUIRED};
use serde::{Deserialize, Serialize};

use super::common;
use crate::logging::AppLogger;
use crate::resources::ServerResources;

/// Login request payload
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    /// Account email
    #[serde(default)]
    pub email: Option<String>,
    /// Plain password
    #[serde(default)]
    pub password: Option<String>,
}

/// Login response with token
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Token for the `Authorization` header
    pub auth_token: String,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/token/login/", post(Self::handle_login))
            .route("/api/auth/token/logout/", post(Self::handle_logout))
            .with_state(resources)
    }

    fn invalid_credentials() -> AppError {
        AppError::invalid_input(INVALID_CREDENTIALS).with_field("non_field_errors", INVALID_CREDENTIALS)
    }

    /// Handle POST /api/auth/token/login/
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: LoginRequest = common::parse_json_body(&body)?;
        let mut errors = ValidationErrors::new();
        let email = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let password = body.password.as_deref().filter(|p| !p.is_empty());
        if email.is_none() {
            errors.add("email", REQUIRED);
        }
        if password.is_none() {
            errors.add("password", REQUIRED);
        }
        errors.into_result()?;
        let (Some(email), Some(password)) = (email, password) else {
            return Err(Self::invalid_credentials());
        };

        let Some(user) = resources
            .database
            .get_user_by_email(email)
            .await?
            .filter(|u| u.is_active)
        else {
            resources.auth_manager.verify_missing_account(password).await?;
            AppLogger::log_auth_event(None, "login", false);
            return Err(Self::invalid_credentials());
        };

        if !resources
            .auth_manager
            .verify_password(password, &user.password_hash)
            .await?
        {
            AppLogger::log_auth_event(Some(user.id), "login", false);
            return Err(Self::invalid_credentials());
        }

        let issued = resources
            .auth_manager
            .issue_token(&resources.database, user.id)
            .await?;
        AppLogger::log_auth_event(Some(user.id), "login", true);

        let response = LoginResponse {
            auth_token: issued.token,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/auth/token/logout/
    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        resources.database.revoke_token(&auth.jti).await?;
        AppLogger::log_auth_event(Some(auth.user.id), "logout", true);
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
