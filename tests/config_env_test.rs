// ABOUTME: Tests for environment driven server configuration
// ABOUTME: Runs serially because each case mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::time::Duration;

use foodgram_server::config::{Environment, ServerConfig};
use serial_test::serial;

const VARS: &[&str] = &[
    "ENVIRONMENT",
    "AUTH_TOKEN_SECRET",
    "HTTP_PORT",
    "PUBLIC_BASE_URL",
    "CORS_ALLOWED_ORIGINS",
    "MEDIA_URL",
    "PAGE_SIZE",
    "BCRYPT_COST",
    "REQUEST_TIMEOUT_SECS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.http.port, 8000);
    assert_eq!(config.http.cors_allowed_origins, vec!["*"]);
    assert_eq!(config.http.public_base_url, None);
    assert_eq!(config.media.url_prefix, "/media/");
    assert_eq!(config.pagination.page_size, 6);
    assert_eq!(config.auth.bcrypt_cost, 12);
    assert_eq!(config.auth.token_secret.len(), 64);
}

#[test]
#[serial]
fn test_overrides() {
    clear_env();
    env::set_var("HTTP_PORT", "9090");
    env::set_var("PUBLIC_BASE_URL", "https://foodgram.example/");
    env::set_var("CORS_ALLOWED_ORIGINS", "http://localhost:3000,https://foodgram.example");
    env::set_var("MEDIA_URL", "uploads");
    env::set_var("PAGE_SIZE", "10");
    env::set_var("REQUEST_TIMEOUT_SECS", "5");
    env::set_var("AUTH_TOKEN_SECRET", "configured-secret");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http.port, 9090);
    assert_eq!(
        config.http.public_base_url.as_deref(),
        Some("https://foodgram.example")
    );
    assert_eq!(config.http.cors_allowed_origins.len(), 2);
    assert_eq!(config.http.request_timeout, Duration::from_secs(5));
    assert_eq!(config.media.url_prefix, "/uploads/");
    assert_eq!(config.pagination.page_size, 10);
    assert_eq!(config.auth.token_secret, "configured-secret");
    assert!(!config.summary().contains("configured-secret"));
}

#[test]
#[serial]
fn test_production_requires_secret() {
    clear_env();
    env::set_var("ENVIRONMENT", "production");
    let result = ServerConfig::from_env();
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    clear_env();
    env::set_var("HTTP_PORT", "eighty");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("BCRYPT_COST", "2");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}
