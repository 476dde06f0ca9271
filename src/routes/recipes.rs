// ABOUTME: Recipe route handlers
// ABOUTME: CRUD with filters, favorites, shopping cart, shopping list download and short links
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! Recipe routes
//!
//! Reads are public. Modifying endpoints check, in order: authentication,
//! existence, authorship, then the request body.

use std::collections::HashSet;
use std::slice;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::Query;
use foodgram_core::constants::limits::{
    MAX_AMOUNT, MAX_COOKING_TIME, MIN_AMOUNT, MIN_COOKING_TIME, RECIPE_NAME_MAX_LEN,
};
use foodgram_core::constants::media::RECIPE_IMAGES;
use foodgram_core::constants::shopping_list::FILE_NAME;
use foodgram_core::constants::short_links::PREFIX;
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{
    parse_flag, render_shopping_list, IngredientAmount, Recipe, RecipeDraft, RecipeFilter,
    RecipeIngredientAmount, Tag, User, UserRecipeList,
};
use foodgram_core::pagination::Page;
use foodgram_core::validation::{ValidationErrors, REQUIRED};
use serde::{Deserialize, Serialize};

use super::common;
use super::users::UserResponse;
use crate::logging::AppLogger;
use crate::media::{decode_data_uri, DecodedImage, MediaStorage};
use crate::resources::ServerResources;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Ingredient line in a recipe payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientAmountRequest {
    /// Ingredient id
    #[serde(default)]
    pub id: Option<i64>,
    /// Quantity
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Create / update payload
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    /// Ingredient lines
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    /// Tag ids
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
    /// `data:image/<ext>;base64,<payload>`
    #[serde(default)]
    pub image: Option<String>,
    /// Title
    #[serde(default)]
    pub name: Option<String>,
    /// Description
    #[serde(default)]
    pub text: Option<String>,
    /// Minutes
    #[serde(default)]
    pub cooking_time: Option<i64>,
}

/// Full recipe representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeResponse {
    /// Recipe id
    pub id: i64,
    /// Tags, ordered by name
    pub tags: Vec<Tag>,
    /// Author as seen by the caller
    pub author: UserResponse,
    /// Ingredient lines, ordered by name
    pub ingredients: Vec<RecipeIngredientAmount>,
    /// Whether the caller favorited it
    pub is_favorited: bool,
    /// Whether it is in the caller's shopping cart
    pub is_in_shopping_cart: bool,
    /// Title
    pub name: String,
    /// Image URL
    pub image: String,
    /// Description
    pub text: String,
    /// Minutes
    pub cooking_time: i64,
}

/// Compact recipe representation used in lists and subscriptions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeShortResponse {
    /// Recipe id
    pub id: i64,
    /// Title
    pub name: String,
    /// Image URL
    pub image: String,
    /// Minutes
    pub cooking_time: i64,
}

impl RecipeShortResponse {
    /// Build from a stored recipe
    #[must_use]
    pub fn new(recipe: &Recipe, media: &MediaStorage) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media.url_for(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Short link to a recipe
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortLinkResponse {
    /// Absolute redirect URL
    #[serde(rename = "short-link")]
    pub short_link: String,
}

/// Recipe list query; `tags` may repeat
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    /// 1-based page
    pub page: Option<String>,
    /// Page size
    pub limit: Option<String>,
    /// Author id
    pub author: Option<String>,
    /// Tag slugs
    #[serde(default)]
    pub tags: Vec<String>,
    /// `1`/`0` favorites filter
    pub is_favorited: Option<String>,
    /// `1`/`0` shopping cart filter
    pub is_in_shopping_cart: Option<String>,
}

/// Recipe content that passed validation
struct ValidatedRecipe {
    draft: RecipeDraft,
    image: Option<DecodedImage>,
}

// ============================================================================
// Routes
// ============================================================================

/// Recipe routes
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/recipes/",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/recipes/download_shopping_cart/",
                get(Self::handle_download_shopping_cart),
            )
            .route(
                "/api/recipes/:id/",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route("/api/recipes/:id/get-link/", get(Self::handle_get_link))
            .route(
                "/api/recipes/:id/favorite/",
                post(Self::handle_add_favorite).delete(Self::handle_remove_favorite),
            )
            .route(
                "/api/recipes/:id/shopping_cart/",
                post(Self::handle_add_to_cart).delete(Self::handle_remove_from_cart),
            )
            .with_state(resources)
    }

    async fn load_recipe(resources: &ServerResources, raw_id: &str) -> AppResult<Recipe> {
        let id = common::parse_id(raw_id, "Recipe")?;
        resources
            .database
            .get_recipe(id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))
    }

    fn ensure_author(user: &User, recipe: &Recipe) -> AppResult<()> {
        if recipe.author_id == user.id {
            Ok(())
        } else {
            Err(AppError::permission_denied(
                "You do not have permission to perform this action.",
            ))
        }
    }

    /// Full representations of `recipes` as seen by `viewer`
    async fn recipe_responses(
        resources: &ServerResources,
        viewer: Option<&User>,
        recipes: &[Recipe],
    ) -> AppResult<Vec<RecipeResponse>> {
        let db = &resources.database;
        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<i64> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut tags = db.tags_for_recipes(&ids).await?;
        let mut ingredients = db.ingredients_for_recipes(&ids).await?;
        let authors = db.get_users(&author_ids).await?;

        let (favorited, in_cart, followed) = match viewer {
            Some(viewer) => (
                db.listed_recipe_ids(UserRecipeList::Favorites, viewer.id, &ids)
                    .await?,
                db.listed_recipe_ids(UserRecipeList::ShoppingCart, viewer.id, &ids)
                    .await?,
                db.followed_author_ids(viewer.id, &author_ids).await?,
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        recipes
            .iter()
            .map(|recipe| {
                let author = authors
                    .get(&recipe.author_id)
                    .ok_or_else(|| AppError::internal("Recipe author is missing"))?;
                Ok(RecipeResponse {
                    id: recipe.id,
                    tags: tags.remove(&recipe.id).unwrap_or_default(),
                    author: UserResponse::new(
                        author,
                        followed.contains(&author.id),
                        &resources.media,
                    ),
                    ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    name: recipe.name.clone(),
                    image: resources.media.url_for(&recipe.image),
                    text: recipe.text.clone(),
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    async fn recipe_response(
        resources: &ServerResources,
        viewer: Option<&User>,
        recipe: &Recipe,
    ) -> AppResult<RecipeResponse> {
        Self::recipe_responses(resources, viewer, slice::from_ref(recipe))
            .await?
            .pop()
            .ok_or_else(|| AppError::internal("Missing recipe representation"))
    }

    // ========================================================================
    // Validation
    // ========================================================================

    async fn check_ingredients(
        resources: &ServerResources,
        errors: &mut ValidationErrors,
        raw: Option<Vec<IngredientAmountRequest>>,
    ) -> AppResult<Vec<IngredientAmount>> {
        const FIELD: &str = "ingredients";
        let Some(items) = raw else {
            errors.add(FIELD, REQUIRED);
            return Ok(Vec::new());
        };
        if items.is_empty() {
            errors.add(FIELD, "Add at least one ingredient.");
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut lines = Vec::new();
        for item in items {
            let Some(id) = item.id else {
                errors.add(FIELD, "Every ingredient needs an id.");
                continue;
            };
            if !seen.insert(id) {
                errors.add(FIELD, "Ingredients must not repeat.");
                continue;
            }
            ids.push(id);
            if let Some(amount) = errors.range(FIELD, item.amount, MIN_AMOUNT, MAX_AMOUNT) {
                lines.push(IngredientAmount {
                    ingredient_id: id,
                    amount,
                });
            }
        }

        let existing: HashSet<i64> = resources
            .database
            .existing_ingredient_ids(&ids)
            .await?
            .into_iter()
            .collect();
        for id in ids.iter().filter(|id| !existing.contains(id)) {
            errors.add(FIELD, format!("Invalid pk \"{id}\" - object does not exist."));
        }
        Ok(lines)
    }

    async fn check_tags(
        resources: &ServerResources,
        errors: &mut ValidationErrors,
        raw: Option<Vec<i64>>,
    ) -> AppResult<Vec<i64>> {
        const FIELD: &str = "tags";
        let Some(tags) = raw else {
            errors.add(FIELD, REQUIRED);
            return Ok(Vec::new());
        };
        if tags.is_empty() {
            errors.add(FIELD, "Add at least one tag.");
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for id in tags {
            if seen.insert(id) {
                ids.push(id);
            } else {
                errors.add(FIELD, "Tags must not repeat.");
            }
        }

        let existing: HashSet<i64> = resources
            .database
            .existing_tag_ids(&ids)
            .await?
            .into_iter()
            .collect();
        for id in ids.iter().filter(|id| !existing.contains(id)) {
            errors.add(FIELD, format!("Invalid pk \"{id}\" - object does not exist."));
        }
        Ok(ids)
    }

    /// Validate a payload; every problem is reported at once
    async fn validate(
        resources: &ServerResources,
        body: RecipeRequest,
        require_image: bool,
    ) -> AppResult<ValidatedRecipe> {
        let mut errors = ValidationErrors::new();

        let ingredients = Self::check_ingredients(resources, &mut errors, body.ingredients).await?;
        let tags = Self::check_tags(resources, &mut errors, body.tags).await?;

        let image = match body.image.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
            Some(raw) => match decode_data_uri("image", raw) {
                Ok(image) => Some(image),
                Err(e) => {
                    for (field, messages) in e.field_errors {
                        for message in messages {
                            errors.add(&field, message);
                        }
                    }
                    None
                }
            },
            None => {
                if require_image {
                    errors.add("image", REQUIRED);
                }
                None
            }
        };

        let name = errors.text("name", body.name.as_deref(), RECIPE_NAME_MAX_LEN);
        let text = errors.text("text", body.text.as_deref(), usize::MAX);
        let cooking_time = errors.range(
            "cooking_time",
            body.cooking_time,
            MIN_COOKING_TIME,
            MAX_COOKING_TIME,
        );

        errors.into_result()?;
        let (Some(name), Some(text), Some(cooking_time)) = (name, text, cooking_time) else {
            return Err(AppError::internal("Recipe validation lost a field"));
        };

        Ok(ValidatedRecipe {
            draft: RecipeDraft {
                name,
                text,
                cooking_time,
                image: None,
                tags,
                ingredients,
            },
            image,
        })
    }

    fn build_filter(query: &RecipeListQuery, viewer: Option<&User>) -> AppResult<RecipeFilter> {
        let author_id = match query.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| AppError::invalid_field("author", "Enter a number."))?,
            ),
            None => None,
        };
        let mut filter = RecipeFilter {
            author_id,
            tag_slugs: query
                .tags
                .iter()
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect(),
            ..RecipeFilter::default()
        };

        // Per-user flags only mean something for an authenticated caller
        if let Some(viewer) = viewer {
            if let Some(raw) = query.is_favorited.as_deref() {
                if parse_flag("is_favorited", raw)? {
                    filter.favorited_by = Some(viewer.id);
                }
            }
            if let Some(raw) = query.is_in_shopping_cart.as_deref() {
                if parse_flag("is_in_shopping_cart", raw)? {
                    filter.in_cart_of = Some(viewer.id);
                }
            }
        }
        Ok(filter)
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Handle GET /api/recipes/ - Filtered, paginated list
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        OriginalUri(uri): OriginalUri,
        Query(query): Query<RecipeListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = common::optional_auth(&headers, &resources).await?;
        let viewer = viewer.as_ref().map(|a| &a.user);
        let request = common::page_request(&resources, query.page.as_deref(), query.limit.as_deref())?;
        let filter = Self::build_filter(&query, viewer)?;

        let count = resources.database.count_recipes(&filter).await?;
        request.ensure_exists(count)?;
        let recipes = resources
            .database
            .list_recipes(&filter, request.limit(), request.offset())
            .await?;
        let results = Self::recipe_responses(&resources, viewer, &recipes).await?;

        let url = common::request_url(&headers, &resources, &uri)?;
        Ok(Json(Page::new(results, count, request, &url)).into_response())
    }

    /// Handle GET /api/recipes/:id/ - Recipe detail
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let viewer = common::optional_auth(&headers, &resources).await?;
        let recipe = Self::load_recipe(&resources, &id).await?;
        let response =
            Self::recipe_response(&resources, viewer.as_ref().map(|a| &a.user), &recipe).await?;
        Ok(Json(response).into_response())
    }

    /// Handle POST /api/recipes/ - Create recipe
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let body: RecipeRequest = common::parse_json_body(&body)?;
        let ValidatedRecipe { mut draft, image } = Self::validate(&resources, body, true).await?;
        let image = image.ok_or_else(|| AppError::invalid_field("image", REQUIRED))?;

        let path = resources.media.save(RECIPE_IMAGES, &image).await?;
        draft.image = Some(path.clone());
        let recipe = match resources.database.create_recipe(auth.user.id, &draft).await {
            Ok(recipe) => recipe,
            Err(e) => {
                resources.media.remove(&path).await;
                return Err(e);
            }
        };
        AppLogger::log_recipe_event(auth.user.id, recipe.id, "created");

        let response = Self::recipe_response(&resources, Some(&auth.user), &recipe).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /api/recipes/:id/ - Update recipe
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let recipe = Self::load_recipe(&resources, &id).await?;
        Self::ensure_author(&auth.user, &recipe)?;
        let body: RecipeRequest = common::parse_json_body(&body)?;
        let ValidatedRecipe { mut draft, image } = Self::validate(&resources, body, false).await?;

        let new_path = match image {
            Some(image) => Some(resources.media.save(RECIPE_IMAGES, &image).await?),
            None => None,
        };
        draft.image.clone_from(&new_path);

        match resources.database.update_recipe(recipe.id, &draft).await {
            Ok(Some(replaced)) => resources.media.remove(&replaced).await,
            Ok(None) => {}
            Err(e) => {
                if let Some(path) = &new_path {
                    resources.media.remove(path).await;
                }
                return Err(e);
            }
        }
        AppLogger::log_recipe_event(auth.user.id, recipe.id, "updated");

        let updated = Self::load_recipe(&resources, &id).await?;
        let response = Self::recipe_response(&resources, Some(&auth.user), &updated).await?;
        Ok(Json(response).into_response())
    }

    /// Handle DELETE /api/recipes/:id/ - Delete recipe
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let recipe = Self::load_recipe(&resources, &id).await?;
        Self::ensure_author(&auth.user, &recipe)?;

        if let Some(deleted) = resources.database.delete_recipe(recipe.id).await? {
            resources.media.remove(&deleted.image).await;
        }
        AppLogger::log_recipe_event(auth.user.id, recipe.id, "deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    // ========================================================================
    // Favorites and shopping cart
    // ========================================================================

    async fn add_to_list(
        resources: &Arc<ServerResources>,
        headers: &HeaderMap,
        raw_id: &str,
        list: UserRecipeList,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(headers, resources).await?;
        let recipe = Self::load_recipe(resources, raw_id).await?;

        if !resources
            .database
            .add_to_list(list, auth.user.id, recipe.id)
            .await?
        {
            return Err(AppError::invalid_input(format!(
                "Recipe is already in {}.",
                list.label()
            )));
        }
        AppLogger::log_list_event(auth.user.id, list.label(), recipe.id, true);

        let response = RecipeShortResponse::new(&recipe, &resources.media);
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    async fn remove_from_list(
        resources: &Arc<ServerResources>,
        headers: &HeaderMap,
        raw_id: &str,
        list: UserRecipeList,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(headers, resources).await?;
        let recipe = Self::load_recipe(resources, raw_id).await?;

        if !resources
            .database
            .remove_from_list(list, auth.user.id, recipe.id)
            .await?
        {
            return Err(AppError::invalid_input(format!(
                "Recipe is not in {}.",
                list.label()
            )));
        }
        AppLogger::log_list_event(auth.user.id, list.label(), recipe.id, false);
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/recipes/:id/favorite/
    async fn handle_add_favorite(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        Self::add_to_list(&resources, &headers, &id, UserRecipeList::Favorites).await
    }

    /// Handle DELETE /api/recipes/:id/favorite/
    async fn handle_remove_favorite(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        Self::remove_from_list(&resources, &headers, &id, UserRecipeList::Favorites).await
    }

    /// Handle POST /api/recipes/:id/shopping_cart/
    async fn handle_add_to_cart(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        Self::add_to_list(&resources, &headers, &id, UserRecipeList::ShoppingCart).await
    }

    /// Handle DELETE /api/recipes/:id/shopping_cart/
    async fn handle_remove_from_cart(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        Self::remove_from_list(&resources, &headers, &id, UserRecipeList::ShoppingCart).await
    }

    /// Handle GET /api/recipes/download_shopping_cart/ - Plain text shopping list
    async fn handle_download_shopping_cart(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = common::authenticate(&headers, &resources).await?;
        let items = resources.database.shopping_list(auth.user.id).await?;

        let response_headers = [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{FILE_NAME}\""),
            ),
        ];
        Ok((StatusCode::OK, response_headers, render_shopping_list(&items)).into_response())
    }

    /// Handle GET /api/recipes/:id/get-link/ - Short link
    async fn handle_get_link(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let recipe = Self::load_recipe(&resources, &id).await?;
        let response = ShortLinkResponse {
            short_link: format!(
                "{}{PREFIX}/{}/",
                common::base_url(&headers, &resources),
                recipe.short_code
            ),
        };
        Ok(Json(response).into_response())
    }
}
