// ABOUTME: Shared resource container injected into every route module
// ABOUTME: Holds the database, auth manager, media storage and configuration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Foodgram Contributors

//! # Server Resources
//!
//! Built once at startup and shared as `Arc<ServerResources>` router state.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::media::MediaStorage;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Storage
    pub database: Arc<Database>,
    /// Password hashing and tokens
    pub auth_manager: Arc<AuthManager>,
    /// Uploaded images
    pub media: Arc<MediaStorage>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble resources from a connected database and loaded configuration
    #[must_use]
    pub fn new(database: Database, config: Arc<ServerConfig>) -> Self {
        Self {
            database: Arc::new(database),
            auth_manager: Arc::new(AuthManager::new(&config.auth)),
            media: Arc::new(MediaStorage::new(&config.media)),
            config,
        }
    }
}
