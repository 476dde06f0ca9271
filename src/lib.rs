// ABOUTME: Main library entry point for the Foodgram recipe sharing API
// ABOUTME: Wires configuration, storage, authentication and HTTP routes into one server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

// recursion_limit: raised for the nested serde/axum handler types
#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Foodgram Server
//!
//! REST backend for publishing recipes. Users follow authors, keep favorites
//! and a shopping cart, and download the summed ingredient list of their cart.
//!
//! ## Architecture
//!
//! - **Config**: environment driven [`config::environment::ServerConfig`]
//! - **Database**: `SQLite` through sqlx with migrations run at startup
//! - **Auth**: bcrypt passwords and revocable signed tokens
//! - **Routes**: one axum router per resource, merged in [`server::build_router`]
//! - **Media**: base64 data URI uploads written under `MEDIA_ROOT`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use foodgram_server::config::environment::ServerConfig;
//! use foodgram_server::database::Database;
//! use foodgram_server::resources::ServerResources;
//! use foodgram_server::server::FoodgramServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(ServerConfig::from_env()?);
//!     let database = Database::new(&config.database.url).await?;
//!     let resources = Arc::new(ServerResources::new(database, config));
//!     FoodgramServer::new(resources).run().await
//! }
//! ```

/// Password hashing and token issuance
pub mod auth;

/// Tag and ingredient catalog loading from JSON files
pub mod catalog_import;

/// Environment configuration
pub mod config;

/// `SQLite` persistence
pub mod database;

/// Tracing subscriber setup and structured domain events
pub mod logging;

/// Uploaded image decoding and storage
pub mod media;

/// HTTP middleware layers
pub mod middleware;

/// Shared state handed to every route
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

pub use foodgram_core::errors;
pub use foodgram_core::models;
