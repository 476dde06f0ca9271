// ABOUTME: User account and subscription route handlers
// ABOUTME: Registration, profiles, password and avatar changes, and following authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! User routes
//!
//! Listing and profile lookups are public. Everything under `me`, the
//! password change and subscriptions require a token.

use std::slice;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use foodgram_core::constants::limits::{
    EMAIL_MAX_LEN, PASSWORD_MAX_LEN, PERSON_NAME_MAX_LEN, RESERVED_USERNAMES, USERNAME_MAX_LEN,
};
use foodgram_core::constants::media::USER_AVATARS;
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{NewUser, User};
use foodgram_core::pagination::Page;
use foodgram_core::validation::{is_valid_email, is_valid_username, ValidationErrors, REQUIRED};
use serde::{Deserialize, Serialize};

use super::common;
use super::recipes::RecipeShortResponse;
use crate::logging::AppLogger;
use crate::media::MediaStorage;
use crate::resources::ServerResources;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Registration payload
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    /// Login email
    #[serde(default)]
    pub email: Option<String>,
    /// Public handle
    #[serde(default)]
    pub username: Option<String>,
    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Plain password
    #[serde(default)]
    pub password: Option<String>,
}

/// Registered account, without subscription state
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Account id
    pub id: i64,
    /// Login email
    pub email: String,
    /// Public handle
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// Password change payload
#[derive(Debug, Default, Deserialize)]
pub struct SetPasswordRequest {
    /// Password currently in use
    #[serde(default)]
    pub current_password: Option<String>,
    /// Replacement password
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Avatar upload payload
#[derive(Debug, Default, Deserialize)]
pub struct AvatarRequest {
    /// `data:image/<ext>;base64,<payload>`
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Avatar upload result
#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarResponse {
    /// Public URL of the stored avatar
    pub avatar: String,
}

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Account id
    pub id: i64,
    /// Login email
    pub email: String,
    /// Public handle
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Whether the caller follows this user
    pub is_subscribed: bool,
    /// Avatar URL
    pub avatar: Option<String>,
}

impl UserResponse {
    /// Build the representation seen by a caller
    #[must_use]
    pub fn new(user: &User, is_subscribed: bool, media: &MediaStorage) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.as_deref().map(|path| media.url_for(path)),
        }
    }
}

/// A followed author with their recipes
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    /// Author
    #[serde(flatten)]
    pub user: UserResponse,
    /// Newest recipes, possibly truncated
    pub recipes: Vec<RecipeShortResponse>,
    /// Total number of recipes by the author
    pub recipes_count: i64,
}

/// `page`/`limit` query
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page
    pub page: Option<String>,
    /// Page size
    pub limit: Option<String>,
}

/// Subscription list query
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    /// 1-based page
    pub page: Option<String>,
    /// Page size
    pub limit: Option<String>,
    /// Maximum recipes shown per author
    pub recipes_limit: Option<String>,
}

/// Optional `recipes_limit` on subscribe
#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    /// Maximum recipes shown for the author
    pub recipes_limit: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

/// User and subscription routes
pub struct UserRoutes;

impl UserRoutes {
    /// Create all user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/",
                get(Self::handle_list_users).post(Self::handle_register),
            )
            .route("/api/users/me/", get(Self::handle_me))
            .route(
                "/api/users/me/avatar/",
                put(Self::handle_set_avatar).delete(Self::handle_delete_avatar),
            )
            .route("/api/users/set_password/", post(Self::handle_set_password))
            .route(
                "/api/users/subscriptions/",
                get(Self::handle_list_subscriptions),
            )
            .route("/api/users/:id/", get(Self::handle_get_user))
            .route(
                "/api/users/:id/subscribe/",
                post(Self::handle_subscribe).delete(Self::handle_unsubscribe),
            )
            .with_state(resources)
    }

    /// Representations of `users` as seen by `viewer`
    async fn user_responses(
        resources: &ServerResources,
        viewer: Option<&User>,
        users: &[User],
    ) -> AppResult<Vec<UserResponse>> {
        let followed = match viewer {
            Some(viewer) => {
                let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
                resources.database.followed_author_ids(viewer.id, &ids).await?
            }
            None => Default::default(),
        };
        Ok(users
            .iter()
            .map(|u| UserResponse::new(u, followed.contains(&u.id), &resources.media))
            .collect())
    }

    /// Subscription representations of authors the caller follows
    async fn subscription_responses(
        resources: &ServerResources,
        authors: &[User],
        recipes_limit: Option<i64>,
    ) -> AppResult<Vec<SubscriptionResponse>> {
        let ids: Vec<i64> = authors.iter().map(|u| u.id).collect();
        let counts = resources.database.recipe_counts(&ids).await?;

        let mut responses = Vec::with_capacity(authors.len());
        for author in authors {
            let recipes = resources
                .database
                .recipes_by_author(author.id, recipes_limit)
                .await?;
            responses.push(SubscriptionResponse {
                user: UserResponse::new(author, true, &resources.media),
                recipes: recipes
                    .iter()
                    .map(|r| RecipeShortResponse::new(r, &resources.media))
                    .collect(),
                recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            });
        }
        Ok(responses)
    }

    fn parse_recipes_limit(raw: Option<&str>) -> AppResult<Option<i64>> {
        let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        match raw.parse::<i64>() {
            Ok(value) if value >= 0 => Ok(Some(value)),
            _ => Err(AppError::invalid_field(
                "recipes_limit",
                "Ensure this value is a non-negative integer.",
            )),
        }
    }

    async fn load_author(resources: &ServerResources, raw_id: &str) -> AppResult<User> {
        let id = common::parse_id(raw_id, "User")?;
        resources
            .database
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    fn validate_registration(body: RegisterRequest) -> AppResult<(NewUser, String)> {
        let mut errors = ValidationErrors::new();

        let email = errors.text("email", body.email.as_deref(), EMAIL_MAX_LEN);
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            errors.add("email", "Enter a valid email address.");
        }

        let username = errors.text("username", body.username.as_deref(), USERNAME_MAX_LEN);
        if let Some(name) = username.as_deref() {
            if !is_valid_username(name) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            } else if RESERVED_USERNAMES
                .iter()
                .any(|reserved| reserved.eq_ignore_ascii_case(name))
            {
                errors.add("username", format!("Username '{name}' is not allowed."));
            }
        }

        let first_name = errors.text("first_name", body.first_name.as_deref(), PERSON_NAME_MAX_LEN);
        let last_name = errors.text("last_name", body.last_name.as_deref(), PERSON_NAME_MAX_LEN);
        // Passwords are taken verbatim; only the blank check trims
        let password = errors
            .text("password", body.password.as_deref(), PASSWORD_MAX_LEN)
            .and(body.password);

        errors.into_result()?;
        match (email, username, first_name, last_name, password) {
            (Some(email), Some(username), Some(first_name), Some(last_name), Some(password)) => Ok((
                NewUser {
                    email,
                    username,
                    first_name,
                    last_name,
                    password_hash: String::new(),
                },
                password,
            )),
            _ => Err(AppError::internal("Registration validation lost a field")),
        }
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Handle POST /api/users/ - Register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let body: RegisterRequest = common::parse_json_body(&body)?;
        let (mut new_user, password) = Self::validate_registration(body)?;
        new_user.password_hash = resources.auth_manager.hash_password(&password).await?;

        let user = resources.database.create_user(&new_user).await?;
        AppLogger::log_auth_event(Some(user.id), "register", true);

        let response = RegisterResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle GET /api/users/ - List users
    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        OriginalUri(uri): OriginalUri,
        Query(query): Query<ListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = common::optional_auth(&headers, &resources).await?;
        let request = common::page_request(&resources, query.page.as_deref(), query.limit.as_deref())?;

        let count = resources.database.count_users().await?;
        request.ensure_exists(count)?;
        let users = resources
            .database
            .list_users(request.limit(), request.offset())
            .await?;
        let results =
            Self::user_responses(&resources, viewer.as_ref().map(|a| &a.user), &users).await?;

        let url = common::request_url(&headers, &resources, &uri)?;
        Ok(Json(Page::new(results, count, request, &url)).into_response())
    }

    /// Handle GET /api/users/:id/ - User profile
    async fn handle_get_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let viewer = common::optional_auth(&headers, &resources).await?;
        let user = Self::load_author(&resources, &id).await?;

        let mut responses = Self::user_responses(
            &resources,
            viewer.as_ref().map(|a| &a.user),
            slice::from_ref(&user),
        )
        .await?;
        let response = responses
            .pop()
            .ok_or_else(|| AppError::internal("Missing user representation"))?;
        Ok(Json(response).into_response())
    }

    /// Handle GET /api/users/me/ - Current user
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        Ok(Json(UserResponse::new(&auth.user, false, &resources.media)).into_response())
    }

    /// Handle POST /api/users/set_password/ - Change password
    async fn handle_set_password(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let body: SetPasswordRequest = common::parse_json_body(&body)?;

        let mut errors = ValidationErrors::new();
        let current = body.current_password.filter(|p| !p.is_empty());
        if current.is_none() {
            errors.add("current_password", REQUIRED);
        }
        let new_password = errors
            .text("new_password", body.new_password.as_deref(), PASSWORD_MAX_LEN)
            .and(body.new_password);
        errors.into_result()?;
        let (Some(current), Some(new_password)) = (current, new_password) else {
            return Err(AppError::internal("Password validation lost a field"));
        };

        if !resources
            .auth_manager
            .verify_password(&current, &auth.user.password_hash)
            .await?
        {
            AppLogger::log_auth_event(Some(auth.user.id), "set_password", false);
            return Err(AppError::invalid_field("current_password", "Invalid password."));
        }

        let hash = resources.auth_manager.hash_password(&new_password).await?;
        resources.database.update_password(auth.user.id, &hash).await?;
        AppLogger::log_auth_event(Some(auth.user.id), "set_password", true);
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle PUT /api/users/me/avatar/ - Upload avatar
    async fn handle_set_avatar(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let body: AvatarRequest = common::parse_json_body(&body)?;
        let data = body
            .avatar
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| AppError::invalid_field("avatar", REQUIRED))?;

        let path = resources
            .media
            .save_data_uri("avatar", USER_AVATARS, &data)
            .await?;
        let previous = match resources.database.set_avatar(auth.user.id, Some(&path)).await {
            Ok(previous) => previous,
            Err(e) => {
                resources.media.remove(&path).await;
                return Err(e);
            }
        };
        if let Some(previous) = previous {
            resources.media.remove(&previous).await;
        }

        let response = AvatarResponse {
            avatar: resources.media.url_for(&path),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle DELETE /api/users/me/avatar/ - Remove avatar
    async fn handle_delete_avatar(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        if auth.user.avatar.is_none() {
            return Err(AppError::invalid_field("avatar", "No avatar is set."));
        }

        if let Some(previous) = resources.database.set_avatar(auth.user.id, None).await? {
            resources.media.remove(&previous).await;
        }
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Handle GET /api/users/subscriptions/ - Followed authors
    async fn handle_list_subscriptions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        OriginalUri(uri): OriginalUri,
        Query(query): Query<SubscriptionsQuery>,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let request = common::page_request(&resources, query.page.as_deref(), query.limit.as_deref())?;
        let recipes_limit = Self::parse_recipes_limit(query.recipes_limit.as_deref())?;

        let count = resources.database.count_followed_authors(auth.user.id).await?;
        request.ensure_exists(count)?;
        let authors = resources
            .database
            .list_followed_authors(auth.user.id, request.limit(), request.offset())
            .await?;
        let results = Self::subscription_responses(&resources, &authors, recipes_limit).await?;

        let url = common::request_url(&headers, &resources, &uri)?;
        Ok(Json(Page::new(results, count, request, &url)).into_response())
    }

    /// Handle POST /api/users/:id/subscribe/ - Follow an author
    async fn handle_subscribe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(query): Query<RecipesLimitQuery>,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let author = Self::load_author(&resources, &id).await?;
        let recipes_limit = Self::parse_recipes_limit(query.recipes_limit.as_deref())?;

        if !resources.database.follow(auth.user.id, author.id).await? {
            return Err(AppError::invalid_input(format!(
                "You are already subscribed to {}.",
                author.username
            )));
        }
        AppLogger::log_list_event(auth.user.id, "subscriptions", author.id, true);

        let mut responses = Self::subscription_responses(
            &resources,
            slice::from_ref(&author),
            recipes_limit,
        )
        .await?;
        let response = responses
            .pop()
            .ok_or_else(|| AppError::internal("Missing subscription representation"))?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle DELETE /api/users/:id/subscribe/ - Unfollow an author
    async fn handle_unsubscribe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let author = Self::load_author(&resources, &id).await?;

        if !resources.database.unfollow(auth.user.id, author.id).await? {
            return Err(AppError::invalid_input(format!(
                "You are not subscribed to {}.",
                author.username
            )));
        }
        AppLogger::log_list_event(auth.user.id, "subscriptions", author.id, false);
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_owned()),
            username: Some(username.to_owned()),
            first_name: Some("Anna".to_owned()),
            last_name: Some("Cook".to_owned()),
            password: Some(" padded pass ".to_owned()),
        }
    }

    #[test]
    fn test_registration_keeps_password_verbatim() {
        let (user, password) =
            UserRoutes::validate_registration(registration("anna", "anna@example.com")).unwrap();
        assert_eq!(user.username, "anna");
        assert_eq!(password, " padded pass ");
    }

    #[test]
    fn test_registration_field_errors() {
        let err = UserRoutes::validate_registration(RegisterRequest::default()).unwrap_err();
        for field in ["email", "username", "first_name", "last_name", "password"] {
            assert!(err.field_errors.contains_key(field), "{field}");
        }

        let err = UserRoutes::validate_registration(registration("Me", "bad-email")).unwrap_err();
        assert!(err.field_errors.contains_key("email"));
        assert!(err.field_errors.contains_key("username"));

        let err = UserRoutes::validate_registration(registration("no spaces", "a@b.co")).unwrap_err();
        assert!(err.field_errors.contains_key("username"));
    }

    #[test]
    fn test_parse_recipes_limit() {
        assert_eq!(UserRoutes::parse_recipes_limit(None).unwrap(), None);
        assert_eq!(UserRoutes::parse_recipes_limit(Some("0")).unwrap(), Some(0));
        assert_eq!(UserRoutes::parse_recipes_limit(Some("3")).unwrap(), Some(3));
        assert!(UserRoutes::parse_recipes_limit(Some("-1")).is_err());
        assert!(UserRoutes::parse_recipes_limit(Some("many")).is_err());
    }
}
