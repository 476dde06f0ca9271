// ABOUTME: Ingredient catalog route handlers
// ABOUTME: Public listing with case-insensitive name prefix search, and lookup by id

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use foodgram_core::errors::AppError;
use serde::Deserialize;

use super::common;
use crate::resources::ServerResources;

/// Ingredient search query
#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Name prefix, matched case-insensitively
    pub name: Option<String>,
}

/// Ingredient routes
pub struct IngredientRoutes;

impl IngredientRoutes {
    /// Create all ingredient routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/ingredients/", get(Self::handle_list))
            .route("/api/ingredients/:id/", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle GET /api/ingredients/?name=<prefix>
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<IngredientQuery>,
    ) -> Result<Response, AppError> {
        let ingredients = resources
            .database
            .list_ingredients(query.name.as_deref())
            .await?;
        Ok(Json(ingredients).into_response())
    }

    /// Handle GET /api/ingredients/:id/
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = common::parse_id(&id, "Ingredient")?;
        let ingredient = resources
            .database
            .get_ingredient(id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))?;
        Ok(Json(ingredient).into_response())
    }
}
