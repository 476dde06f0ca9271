// ABOUTME: Logging configuration and structured logging setup for the Foodgram server
// ABOUTME: Configures log levels, output formats, noise filters, and domain event helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Foodgram Contributors

//! Structured logging with `tracing`

use std::env;
use std::io;

use anyhow::{anyhow, Result};
use foodgram_core::constants::service_names;
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread information
    pub include_thread: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, production, testing)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for terminals and CLI tools
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value, defaulting to pretty output
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: service_names::FOODGRAM_SERVER.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let format = env::var("LOG_FORMAT")
            .map_or(LogFormat::Pretty, |v| LogFormat::from_str_or_default(&v));
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_thread: is_production || env::var("LOG_INCLUDE_THREAD").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| service_names::FOODGRAM_SERVER.into()),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment,
        }
    }

    /// Compact, debug-level output for command line tools
    #[must_use]
    pub fn for_cli(verbose: bool) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.into(),
            format: LogFormat::Compact,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG wins over the configured level, noise reduction applies either way
        let base = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        let directive = |raw: &str, fallback: Level| raw.parse().unwrap_or_else(|_| fallback.into());

        EnvFilter::new(base)
            .add_directive(directive("hyper=warn", Level::WARN))
            .add_directive(directive("hyper_util=warn", Level::WARN))
            .add_directive(directive("sqlx=warn", Level::WARN))
            .add_directive(directive("tower_http=info", Level::INFO))
            .add_directive(directive(
                &format!("foodgram_server={}", self.level),
                Level::INFO,
            ))
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let installed = match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_thread_ids(self.include_thread)
                        .with_thread_names(self.include_thread)
                        .with_target(true)
                        .with_writer(io::stdout)
                        .with_span_events(span_events)
                        .json(),
                )
                .try_init(),
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_thread_ids(self.include_thread)
                        .with_thread_names(self.include_thread)
                        .with_target(true)
                        .with_writer(io::stdout)
                        .with_span_events(span_events),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .try_init(),
        };
        installed.map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );

        let summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "location": self.include_location,
                "thread": self.include_thread
            }
        });
        tracing::debug!("Logging configuration: {summary}");
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured log lines for domain events
pub struct AppLogger;

impl AppLogger {
    /// Log user authentication events
    pub fn log_auth_event(user_id: Option<i64>, event: &str, success: bool) {
        if success {
            info!(user.id = ?user_id, auth.event = %event, auth.success = true, "Authentication event");
        } else {
            warn!(user.id = ?user_id, auth.event = %event, auth.success = false, "Authentication event");
        }
    }

    /// Log recipe writes
    pub fn log_recipe_event(user_id: i64, recipe_id: i64, event: &str) {
        info!(user.id = user_id, recipe.id = recipe_id, recipe.event = %event, "Recipe event");
    }

    /// Log favorite, cart, and follow changes
    pub fn log_list_event(user_id: i64, list: &str, target_id: i64, added: bool) {
        info!(
            user.id = user_id,
            list = %list,
            target.id = target_id,
            added,
            "User list changed"
        );
    }

    /// Log catalog import results
    pub fn log_import(kind: &str, added: usize, skipped: usize) {
        info!(import.kind = %kind, import.added = added, import.skipped = skipped, "Catalog import finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str_or_default("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_or_default("COMPACT"), LogFormat::Compact);
        assert_eq!(LogFormat::from_str_or_default("other"), LogFormat::Pretty);
    }

    #[test]
    fn test_cli_config() {
        let config = LoggingConfig::for_cli(true);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
    }
}
