// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Builds the full router over an in-memory database and registers test users
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Foodgram Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
//! Shared test utilities for `foodgram_server`
//!
//! Every test gets its own in-memory database and media directory.

use std::env;
use std::path::Path;
use std::sync::{Arc, Once};

use axum::http::StatusCode;
use axum::Router;
use foodgram_server::config::environment::ServerConfig;
use foodgram_server::database::Database;
use foodgram_server::models::{NewIngredient, NewTag};
use foodgram_server::resources::ServerResources;
use foodgram_server::server::build_router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tracing::Level;

use crate::helpers::axum_test::AxumTestRequest;

/// 1x1 transparent PNG as a data URI
pub const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Password used for every test account
pub const TEST_PASSWORD: &str = "s3cure-Passw0rd";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// A registered account with a live token
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Catalog rows created by [`TestApp::seed_catalog`]
pub struct Catalog {
    /// Breakfast, Dinner, Lunch
    pub tag_ids: Vec<i64>,
    /// eggs, flour, milk (ordered by name)
    pub ingredient_ids: Vec<i64>,
}

/// The full application over an in-memory database
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    media_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        init_test_logging();
        let media_dir = TempDir::new().expect("Failed to create media directory");
        let config = ServerConfig::for_testing(media_dir.path().to_path_buf());
        let database = Database::new(&config.database.url)
            .await
            .expect("Failed to create test database");
        let resources = Arc::new(ServerResources::new(database, Arc::new(config)));
        Self {
            resources,
            media_dir,
        }
    }

    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    pub fn media_root(&self) -> &Path {
        self.media_dir.path()
    }

    pub fn database(&self) -> &Database {
        &self.resources.database
    }

    /// Register through the API and log in
    pub async fn register_user(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let created: Value = AxumTestRequest::post("/api/users/")
            .json(&json!({
                "email": email,
                "username": username,
                "first_name": "Test",
                "last_name": "Cook",
                "password": TEST_PASSWORD,
            }))
            .send(self.router())
            .await
            .assert_status(StatusCode::CREATED)
            .json();

        let token = self.login(&email, TEST_PASSWORD).await;
        TestUser {
            id: created["id"].as_i64().expect("user id"),
            username: username.to_owned(),
            email,
            token,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let body: Value = AxumTestRequest::post("/api/auth/token/login/")
            .json(&json!({"email": email, "password": password}))
            .send(self.router())
            .await
            .assert_status(StatusCode::OK)
            .json();
        body["auth_token"].as_str().expect("auth_token").to_owned()
    }

    /// Three tags and three ingredients
    pub async fn seed_catalog(&self) -> Catalog {
        let mut tag_ids = Vec::new();
        for (name, slug) in [("Breakfast", "breakfast"), ("Dinner", "dinner"), ("Lunch", "lunch")] {
            let tag = self
                .database()
                .create_tag(&NewTag {
                    name: name.to_owned(),
                    slug: slug.to_owned(),
                })
                .await
                .expect("Failed to create tag");
            tag_ids.push(tag.id);
        }

        let items: Vec<NewIngredient> = [("eggs", "pcs"), ("flour", "g"), ("milk", "ml")]
            .into_iter()
            .map(|(name, unit)| NewIngredient {
                name: name.to_owned(),
                measurement_unit: unit.to_owned(),
            })
            .collect();
        self.database()
            .import_ingredients(&items)
            .await
            .expect("Failed to import ingredients");
        let ingredient_ids = self
            .database()
            .list_ingredients(None)
            .await
            .expect("Failed to list ingredients")
            .into_iter()
            .map(|i| i.id)
            .collect();

        Catalog {
            tag_ids,
            ingredient_ids,
        }
    }

    /// Create a recipe through the API and return its representation
    pub async fn create_recipe(
        &self,
        user: &TestUser,
        name: &str,
        tags: &[i64],
        ingredients: &[(i64, i64)],
    ) -> Value {
        AxumTestRequest::post("/api/recipes/")
            .token(&user.token)
            .json(&recipe_payload(name, tags, ingredients))
            .send(self.router())
            .await
            .assert_status(StatusCode::CREATED)
            .json()
    }
}

/// A valid create payload
pub fn recipe_payload(name: &str, tags: &[i64], ingredients: &[(i64, i64)]) -> Value {
    json!({
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({"id": id, "amount": amount}))
            .collect::<Vec<_>>(),
        "tags": tags,
        "image": PNG_DATA_URI,
        "name": name,
        "text": format!("How to make {name}"),
        "cooking_time": 15,
    })
}
