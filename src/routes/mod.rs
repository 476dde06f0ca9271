// ABOUTME: Route module organization for the Foodgram HTTP API
// ABOUTME: One route struct per domain, each building its own axum Router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! HTTP routes
//!
//! Each domain module exposes a `*Routes` struct whose `routes` function
//! returns a `Router` with the shared resources already applied as state.

/// Token login and logout
pub mod auth;
/// Authentication and URL helpers shared by handlers
pub mod common;
/// Health check
pub mod health;
/// Ingredient catalog
pub mod ingredients;
/// Recipes, favorites, shopping cart and shopping list export
pub mod recipes;
/// Short link redirects
pub mod short_links;
/// Tag catalog
pub mod tags;
/// Accounts and subscriptions
pub mod users;

pub use auth::AuthRoutes;
pub use health::HealthRoutes;
pub use ingredients::IngredientRoutes;
pub use recipes::RecipeRoutes;
pub use short_links::ShortLinkRoutes;
pub use tags::TagRoutes;
pub use users::UserRoutes;
