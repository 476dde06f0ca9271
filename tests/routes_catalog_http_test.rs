// ABOUTME: HTTP integration tests for the read-only catalog and service endpoints
// ABOUTME: Covers tags, ingredient search, catalog file loading, health, and unknown routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! HTTP integration tests for tags, ingredients and health

mod common;
mod helpers;

use std::fs;

use axum::http::StatusCode;
use common::TestApp;
use foodgram_server::catalog_import;
use helpers::axum_test::AxumTestRequest;
use serde_json::Value;
use tempfile::TempDir;

#[tokio::test]
async fn test_tags_are_listed_by_name() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let tags: Value = AxumTestRequest::get("/api/tags/")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let slugs: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["breakfast", "dinner", "lunch"]);

    let tag: Value = AxumTestRequest::get(&format!("/api/tags/{}/", catalog.tag_ids[1]))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(tag["name"], "Dinner");
    assert_eq!(tag["slug"], "dinner");
    assert_eq!(tag["id"], catalog.tag_ids[1]);

    AxumTestRequest::get("/api/tags/9999/")
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingredient_prefix_search() {
    let app = TestApp::new().await;
    let catalog = app.seed_catalog().await;

    let all: Value = AxumTestRequest::get("/api/ingredients/")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(all.as_array().unwrap().len(), 3);
    assert_eq!(all[0]["name"], "eggs");

    let matches: Value = AxumTestRequest::get("/api/ingredients/?name=FL")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let matches = matches.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["name"], "flour");
    assert_eq!(matches[0]["measurement_unit"], "g");

    // Prefix only, not substring
    let none: Value = AxumTestRequest::get("/api/ingredients/?name=our")
        .send(app.router())
        .await
        .json();
    assert!(none.as_array().unwrap().is_empty());

    let one: Value = AxumTestRequest::get(&format!("/api/ingredients/{}/", catalog.ingredient_ids[2]))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(one["name"], "milk");

    AxumTestRequest::get("/api/ingredients/9999/")
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_loaded_catalog_is_searchable() {
    let app = TestApp::new().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ingredients.json");
    fs::write(
        &path,
        r#"[{"name": "Абрикосы", "measurement_unit": "г"}, {"name": "апельсины", "measurement_unit": "шт."}]"#,
    )
    .unwrap();

    let report = catalog_import::load_ingredients_file(app.database(), &path)
        .await
        .unwrap();
    assert_eq!(report.added, 2);

    let matches: Value = AxumTestRequest::get("/api/ingredients/?name=%D0%B0%D0%B1")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let matches = matches.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["name"], "Абрикосы");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let response = AxumTestRequest::get("/health")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    assert!(response
        .header("x-request-id")
        .is_some_and(|id| id.starts_with("req_")));

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "foodgram-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::get("/api/unknown/")
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .json();
    assert_eq!(body["detail"], "Not found.");
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");
}
