// ABOUTME: Token-based user authentication with bcrypt password hashing
// ABOUTME: Issues HS256 JWTs registered by id, validates them, and resolves the calling user
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Foodgram Contributors

//! # Authentication
//!
//! Passwords are stored as bcrypt hashes. A successful login issues an HS256
//! JWT whose `jti` is recorded in the `auth_tokens` table; a token is only
//! accepted while that row exists, so logout revokes it immediately.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use foodgram_core::constants::{auth, service_names};
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::User;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::database::Database;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone, Error)]
pub enum JwtValidationError {
    /// Token has expired
    #[error("token expired at {expired_at}")]
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Token signature or claims are invalid
    #[error("token is invalid: {reason}")]
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is not a well-formed `JWT`
    #[error("token is malformed: {details}")]
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

/// `JWT` claims for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Token id, registered in `auth_tokens`
    pub jti: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience
    pub aud: String,
}

impl Claims {
    /// User id carried in `sub`
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if `sub` is not an integer
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::auth_invalid("Invalid token."))
    }
}

/// A freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded token for the client
    pub token: String,
    /// Registered token id
    pub jti: String,
    /// Expiry
    pub expires_at: DateTime<Utc>,
}

/// The user behind an authenticated request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Account
    pub user: User,
    /// Token id used for this request, needed by logout
    pub jti: String,
}

/// Authentication manager for tokens and password hashes
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_hours: i64,
    bcrypt_cost: u32,
    /// Hash checked when the account does not exist, built on first use
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.token_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl_hours: config.token_ttl_hours,
            bcrypt_cost: config.bcrypt_cost,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Hash a password on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
    }

    /// Check a password against a stored hash on the blocking pool
    ///
    /// A malformed stored hash counts as a mismatch.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the blocking task panics
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
    }

    /// Spend the same bcrypt work as a real check when no account matches
    ///
    /// Login calls this for unknown emails so response time does not reveal
    /// which addresses are registered. The outcome is always a mismatch.
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing or verification fails
    pub async fn verify_missing_account(&self, password: &str) -> AppResult<bool> {
        let decoy = Uuid::new_v4().to_string();
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.hash_password(&decoy))
            .await?;
        self.verify_password(password, hash).await?;
        Ok(false)
    }

    /// Encode a new token for a user
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails
    pub fn generate_token(&self, user_id: i64) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.token_ttl_hours);
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            jti: jti.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: service_names::FOODGRAM_SERVER.to_owned(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    fn validation(validate_exp: bool) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = validate_exp;
        validation.leeway = 0;
        validation.set_audience(&[service_names::FOODGRAM_SERVER]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation
    }

    /// Verify signature, audience, and expiry
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing why the token was rejected
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        match decode::<Claims>(token, &self.decoding_key, &Self::validation(true)) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                // Signature is valid; decode again only to report when it expired
                let expired_at = decode::<Claims>(token, &self.decoding_key, &Self::validation(false))
                    .ok()
                    .and_then(|data| DateTime::from_timestamp(data.claims.exp, 0))
                    .unwrap_or_else(Utc::now);
                Err(JwtValidationError::TokenExpired { expired_at })
            }
            Err(e) => Err(Self::convert_jwt_error(&e)),
        }
    }

    fn convert_jwt_error(e: &JwtError) -> JwtValidationError {
        match e.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => JwtValidationError::TokenMalformed {
                details: e.to_string(),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: e.to_string(),
            },
        }
    }

    /// Issue and register a token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the database insert fails
    pub async fn issue_token(&self, db: &Database, user_id: i64) -> AppResult<IssuedToken> {
        let issued = self.generate_token(user_id)?;
        db.store_token(&issued.jti, user_id, issued.expires_at).await?;
        Ok(issued)
    }

    /// Resolve a raw token to an active user
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the token fails validation, was revoked, or
    /// belongs to a missing or inactive user
    pub async fn authenticate_token(&self, db: &Database, token: &str) -> AppResult<AuthenticatedUser> {
        let claims = self.validate_token(token).map_err(|e| {
            debug!(error = %e, "Token rejected");
            AppError::auth_invalid("Invalid token.")
        })?;
        let user_id = claims.user_id()?;

        if !db.is_token_active(&claims.jti, user_id).await? {
            warn!(user.id = user_id, "Revoked or unknown token presented");
            return Err(AppError::auth_invalid("Invalid token."));
        }

        let user = db
            .get_user(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::auth_invalid("User inactive or deleted."))?;

        Ok(AuthenticatedUser {
            user,
            jti: claims.jti,
        })
    }
}

/// Extract the token from an `Authorization` header value
///
/// Accepts `Token <t>` and `Bearer <t>`; the scheme is case-insensitive.
#[must_use]
pub fn extract_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case(auth::TOKEN_SCHEME)
        || scheme.eq_ignore_ascii_case(auth::BEARER_SCHEME);
    (known && !token.is_empty() && !token.contains(' ')).then_some(token)
}
