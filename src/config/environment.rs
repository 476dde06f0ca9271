// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses HTTP, database, media, auth, and pagination settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use foodgram_core::constants::{auth, pagination, ports};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default SQLite location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/foodgram.db";
/// Default bcrypt cost
pub const DEFAULT_BCRYPT_COST: u32 = 12;
/// Default request body limit (10 MiB, enough for base64 images)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Deployed service
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// HTTP listener and middleware settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Absolute base used for short links; derived from `Host` when unset
    pub public_base_url: Option<String>,
    /// Allowed CORS origins, `*` for any
    pub cors_allowed_origins: Vec<String>,
    /// Request body limit
    pub max_body_bytes: usize,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL
    pub url: String,
}

/// Uploaded media settings
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory files are written to
    pub root: PathBuf,
    /// Public URL prefix, with leading and trailing slash
    pub url_prefix: String,
}

/// Token and password settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for issued tokens
    pub token_secret: String,
    /// Token lifetime in hours
    pub token_ttl_hours: i64,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[redacted]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Pagination defaults
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    /// Page size when `limit` is absent
    pub page_size: u32,
    /// Upper bound for `limit`
    pub max_page_size: u32,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// HTTP settings
    pub http: HttpConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Media settings
    pub media: MediaConfig,
    /// Auth settings
    pub auth: AuthConfig,
    /// Pagination settings
    pub pagination: PaginationConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed, or if production runs
    /// without an explicit token secret
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let environment =
            Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let token_secret = match env::var("AUTH_TOKEN_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment.is_production() => {
                bail!("AUTH_TOKEN_SECRET must be set in production")
            }
            _ => {
                warn!("AUTH_TOKEN_SECRET not set, generating an ephemeral secret; tokens will not survive a restart");
                random_secret()
            }
        };

        let config = Self {
            environment,
            http: HttpConfig {
                host: env_var_or("HOST", "0.0.0.0"),
                port: env_parse("HTTP_PORT", ports::DEFAULT_HTTP_PORT)?,
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .ok()
                    .map(|url| url.trim().trim_end_matches('/').to_owned())
                    .filter(|url| !url.is_empty()),
                cors_allowed_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
                max_body_bytes: env_parse("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
                request_timeout: Duration::from_secs(env_parse(
                    "REQUEST_TIMEOUT_SECS",
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?),
            },
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            },
            media: MediaConfig {
                root: PathBuf::from(env_var_or("MEDIA_ROOT", "./media")),
                url_prefix: normalize_url_prefix(&env_var_or("MEDIA_URL", "/media/")),
            },
            auth: AuthConfig {
                token_secret,
                token_ttl_hours: env_parse("AUTH_TOKEN_TTL_HOURS", auth::DEFAULT_TOKEN_TTL_HOURS)?,
                bcrypt_cost: env_parse("BCRYPT_COST", DEFAULT_BCRYPT_COST)?,
            },
            pagination: PaginationConfig {
                page_size: env_parse("PAGE_SIZE", pagination::DEFAULT_PAGE_SIZE)?,
                max_page_size: env_parse("MAX_PAGE_SIZE", pagination::MAX_PAGE_SIZE)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests: in-memory database, cheap hashing, fixed secret
    #[must_use]
    pub fn for_testing(media_root: PathBuf) -> Self {
        Self {
            environment: Environment::Testing,
            http: HttpConfig {
                host: "127.0.0.1".into(),
                port: 0,
                public_base_url: None,
                cors_allowed_origins: vec!["*".into()],
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".into(),
            },
            media: MediaConfig {
                root: media_root,
                url_prefix: "/media/".into(),
            },
            auth: AuthConfig {
                token_secret: "test-secret-for-foodgram-tokens".into(),
                token_ttl_hours: auth::DEFAULT_TOKEN_TTL_HOURS,
                bcrypt_cost: 4,
            },
            pagination: PaginationConfig {
                page_size: pagination::DEFAULT_PAGE_SIZE,
                max_page_size: pagination::MAX_PAGE_SIZE,
            },
        }
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        if self.auth.token_ttl_hours <= 0 {
            bail!("AUTH_TOKEN_TTL_HOURS must be positive");
        }
        if self.pagination.page_size == 0 || self.pagination.max_page_size == 0 {
            bail!("PAGE_SIZE and MAX_PAGE_SIZE must be positive");
        }
        Ok(())
    }

    /// One-line summary for startup logs; never includes secrets
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} http={}:{} database={} media_root={} media_url={} page_size={}",
            self.environment,
            self.http.host,
            self.http.port,
            self.database.url,
            self.media.root.display(),
            self.media.url_prefix,
            self.pagination.page_size,
        )
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Force a leading and trailing slash onto a URL prefix
fn normalize_url_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}

fn random_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://foodgram.example ,"),
            vec!["http://localhost:3000", "https://foodgram.example"]
        );
    }

    #[test]
    fn test_normalize_url_prefix() {
        assert_eq!(normalize_url_prefix("media"), "/media/");
        assert_eq!(normalize_url_prefix("/static/media/"), "/static/media/");
        assert_eq!(normalize_url_prefix("/"), "/");
    }

    #[test]
    fn test_environment_parsing() {
        assert!(Environment::from_str_or_default("PROD").is_production());
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("anything"),
            Environment::Development
        );
    }

    #[test]
    fn test_testing_config_is_valid() {
        let config = ServerConfig::for_testing(PathBuf::from("/tmp/media"));
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", config.auth).contains("test-secret"));
    }
}
