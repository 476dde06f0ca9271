// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! Configuration module for the Foodgram server
//!
//! All settings come from environment variables; see
//! [`environment::ServerConfig::from_env`].

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AuthConfig, DatabaseConfig, Environment, HttpConfig, MediaConfig, PaginationConfig,
    ServerConfig,
};
