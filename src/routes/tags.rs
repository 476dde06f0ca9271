// ABOUTME: Tag catalog route handlers
// ABOUTME: Public, unpaginated listing and lookup of recipe tags

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use foodgram_core::errors::AppError;

use super::common;
use crate::resources::ServerResources;

/// Tag routes
pub struct TagRoutes;

impl TagRoutes {
    /// Create all tag routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/tags/", get(Self::handle_list))
            .route("/api/tags/:id/", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle GET /api/tags/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let tags = resources.database.list_tags().await?;
        Ok(Json(tags).into_response())
    }

    /// Handle GET /api/tags/:id/
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = common::parse_id(&id, "Tag")?;
        let tag = resources
            .database
            .get_tag(id)
            .await?
            .ok_or_else(|| AppError::not_found("Tag"))?;
        Ok(Json(tag).into_response())
    }
}
