// ABOUTME: Short link redirect handler
// ABOUTME: Resolves /s/<code>/ to the recipe page, or to the not-found page for unknown codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use foodgram_core::constants::short_links::{NOT_FOUND_PAGE, RECIPE_PAGE_PREFIX};
use foodgram_core::errors::AppError;
use foodgram_core::short_code;
use tracing::debug;

use crate::resources::ServerResources;

/// Short link routes
pub struct ShortLinkRoutes;

impl ShortLinkRoutes {
    /// Create the redirect route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/s/:code/", get(Self::handle_redirect))
            .with_state(resources)
    }

    /// Handle GET /s/:code/ - 302 to the recipe page
    async fn handle_redirect(
        State(resources): State<Arc<ServerResources>>,
        Path(code): Path<String>,
    ) -> Result<Response, AppError> {
        let recipe_id = if short_code::is_well_formed(&code) {
            resources.database.recipe_id_by_short_code(&code).await?
        } else {
            None
        };

        let target = recipe_id.map_or_else(
            || {
                debug!(code = %code, "Unknown short link");
                NOT_FOUND_PAGE.to_owned()
            },
            |id| format!("{RECIPE_PAGE_PREFIX}{id}/"),
        );
        Ok((StatusCode::FOUND, [(LOCATION, target)]).into_response())
    }
}
