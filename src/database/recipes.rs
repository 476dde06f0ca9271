// ABOUTME: Recipe database operations with tag and ingredient links
// ABOUTME: Create/update/delete in transactions, filtered listing, batch link loading, short codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::collections::HashMap;

use chrono::Utc;
use foodgram_core::constants::short_links::MAX_GENERATION_ATTEMPTS;
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{
    Recipe, RecipeDraft, RecipeFilter, RecipeIngredientAmount, Tag, UserRecipeList,
};
use foodgram_core::short_code;
use foodgram_core::validation::REQUIRED;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::warn;

use super::{format_timestamp, is_unique_violation, parse_timestamp, Database};

const RECIPE_COLUMNS: &str =
    "r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, r.short_code, r.pub_date";

impl Database {
    /// Create recipe tables
    pub(super) async fn migrate_recipes(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                image TEXT NOT NULL,
                text TEXT NOT NULL,
                cooking_time INTEGER NOT NULL CHECK (cooking_time >= 1),
                short_code TEXT NOT NULL UNIQUE,
                pub_date TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS recipe_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                UNIQUE (recipe_id, tag_id)
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS recipe_ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                amount INTEGER NOT NULL CHECK (amount >= 1),
                UNIQUE (recipe_id, ingredient_id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_recipes_author ON recipes(author_id)",
            "CREATE INDEX IF NOT EXISTS idx_recipes_pub_date ON recipes(pub_date)",
            "CREATE INDEX IF NOT EXISTS idx_recipe_tags_tag ON recipe_tags(tag_id)",
            "CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id)",
        ])
        .await
    }

    /// Create a recipe with its tags and ingredients and a fresh short code
    ///
    /// # Errors
    ///
    /// Returns an error if the draft has no image, no unique short code could
    /// be generated, or the transaction fails
    pub async fn create_recipe(&self, author_id: i64, draft: &RecipeDraft) -> AppResult<Recipe> {
        let image = draft
            .image
            .as_deref()
            .ok_or_else(|| AppError::invalid_field("image", REQUIRED))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let pub_date = format_timestamp(Utc::now());
        let mut recipe_id = None;
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = short_code::generate();
            let inserted = sqlx::query(
                r"
                INSERT INTO recipes (author_id, name, image, text, cooking_time, short_code, pub_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(author_id)
            .bind(&draft.name)
            .bind(image)
            .bind(&draft.text)
            .bind(draft.cooking_time)
            .bind(&code)
            .bind(&pub_date)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(result) => {
                    recipe_id = Some(result.last_insert_rowid());
                    break;
                }
                // short_code is the only unique column on recipes
                Err(e) if is_unique_violation(&e) => {
                    warn!(attempt, "Short code collision, regenerating");
                }
                Err(e) => return Err(AppError::database(format!("Failed to create recipe: {e}"))),
            }
        }
        let recipe_id = recipe_id
            .ok_or_else(|| AppError::internal("Could not generate a unique short code"))?;

        insert_links(&mut *tx, recipe_id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit recipe: {e}")))?;

        self.get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::internal("Created recipe could not be read back"))
    }

    /// Replace a recipe's fields, tags, and ingredients
    ///
    /// Keeps the stored image when the draft carries none. Returns the
    /// replaced image path so the caller can remove the file.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the recipe is gone, or an error if the
    /// transaction fails
    pub async fn update_recipe(&self, recipe_id: i64, draft: &RecipeDraft) -> AppResult<Option<String>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let previous_image: String = sqlx::query_scalar("SELECT image FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to read recipe: {e}")))?
            .ok_or_else(|| AppError::not_found("Recipe"))?;

        sqlx::query(
            r"
            UPDATE recipes
            SET name = $1, text = $2, cooking_time = $3, image = COALESCE($4, image)
            WHERE id = $5
            ",
        )
        .bind(&draft.name)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(draft.image.as_deref())
        .bind(recipe_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update recipe: {e}")))?;

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear recipe tags: {e}")))?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear recipe ingredients: {e}")))?;

        insert_links(&mut *tx, recipe_id, draft).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit recipe update: {e}")))?;

        Ok(draft
            .image
            .as_ref()
            .filter(|new| **new != previous_image)
            .map(|_| previous_image))
    }

    /// Delete a recipe; join rows cascade. Returns the deleted row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails
    pub async fn delete_recipe(&self, recipe_id: i64) -> AppResult<Option<Recipe>> {
        let Some(recipe) = self.get_recipe(recipe_id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(recipe_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete recipe: {e}")))?;
        Ok(Some(recipe))
    }

    /// Get a recipe by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_recipe(&self, recipe_id: i64) -> AppResult<Option<Recipe>> {
        let row = sqlx::query(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"
        ))
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        row.map(|r| Self::row_to_recipe(&r)).transpose()
    }

    /// Resolve a short code to a recipe id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_id_by_short_code(&self, code: &str) -> AppResult<Option<i64>> {
        sqlx::query_scalar("SELECT id FROM recipes WHERE short_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to resolve short code: {e}")))
    }

    /// Page of recipes matching `filter`, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Recipe>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r"));
        push_filters(&mut query, filter);
        query.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list recipes: {e}")))?;

        rows.iter().map(Self::row_to_recipe).collect()
    }

    /// Number of recipes matching `filter`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_recipes(&self, filter: &RecipeFilter) -> AppResult<i64> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes r");
        push_filters(&mut query, filter);

        query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count recipes: {e}")))
    }

    /// An author's recipes, newest first, optionally truncated
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipes_by_author(&self, author_id: i64, limit: Option<i64>) -> AppResult<Vec<Recipe>> {
        let filter = RecipeFilter {
            author_id: Some(author_id),
            ..RecipeFilter::default()
        };
        // SQLite treats a negative LIMIT as "no limit"
        self.list_recipes(&filter, limit.unwrap_or(-1), 0).await
    }

    /// Tags of each recipe in `recipe_ids`, ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn tags_for_recipes(&self, recipe_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Tag>>> {
        let mut by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(by_recipe);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            r"
            SELECT rt.recipe_id, t.id, t.name, t.slug
            FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id IN (",
        );
        push_id_list(&mut query, recipe_ids);
        query.push(") ORDER BY t.name, t.id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load recipe tags: {e}")))?;

        for row in &rows {
            by_recipe
                .entry(row.get("recipe_id"))
                .or_default()
                .push(Self::row_to_tag(row));
        }
        Ok(by_recipe)
    }

    /// Ingredient lines of each recipe in `recipe_ids`, in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn ingredients_for_recipes(
        &self,
        recipe_ids: &[i64],
    ) -> AppResult<HashMap<i64, Vec<RecipeIngredientAmount>>> {
        let mut by_recipe: HashMap<i64, Vec<RecipeIngredientAmount>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(by_recipe);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            r"
            SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id IN (",
        );
        push_id_list(&mut query, recipe_ids);
        query.push(") ORDER BY ri.id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load recipe ingredients: {e}")))?;

        for row in &rows {
            by_recipe
                .entry(row.get("recipe_id"))
                .or_default()
                .push(RecipeIngredientAmount {
                    id: row.get("id"),
                    name: row.get("name"),
                    measurement_unit: row.get("measurement_unit"),
                    amount: row.get("amount"),
                });
        }
        Ok(by_recipe)
    }

    fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
        let pub_date: String = row.get("pub_date");
        Ok(Recipe {
            id: row.get("id"),
            author_id: row.get("author_id"),
            name: row.get("name"),
            image: row.get("image"),
            text: row.get("text"),
            cooking_time: row.get("cooking_time"),
            short_code: row.get("short_code"),
            pub_date: parse_timestamp(&pub_date)?,
        })
    }
}

/// Insert the tag and ingredient rows of a draft
async fn insert_links(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> AppResult<()> {
    if !draft.tags.is_empty() {
        let mut query = QueryBuilder::<Sqlite>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(&draft.tags, |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to link recipe tags: {e}")))?;
    }

    if !draft.ingredients.is_empty() {
        let mut query = QueryBuilder::<Sqlite>::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );
        query.push_values(&draft.ingredients, |mut row, item| {
            row.push_bind(recipe_id)
                .push_bind(item.ingredient_id)
                .push_bind(item.amount);
        });
        query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to link recipe ingredients: {e}")))?;
    }
    Ok(())
}

fn push_id_list(query: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}

fn push_list_membership(query: &mut QueryBuilder<'_, Sqlite>, list: UserRecipeList, user_id: i64) {
    query.push(format!(
        " AND EXISTS (SELECT 1 FROM {} l WHERE l.recipe_id = r.id AND l.user_id = ",
        list.table()
    ));
    query.push_bind(user_id);
    query.push(")");
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &RecipeFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(author_id) = filter.author_id {
        query.push(" AND r.author_id = ");
        query.push_bind(author_id);
    }

    if !filter.tag_slugs.is_empty() {
        query.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
             WHERE rt.recipe_id = r.id AND t.slug IN (",
        );
        let mut separated = query.separated(", ");
        for slug in &filter.tag_slugs {
            separated.push_bind(slug.clone());
        }
        query.push("))");
    }

    if let Some(user_id) = filter.favorited_by {
        push_list_membership(query, UserRecipeList::Favorites, user_id);
    }
    if let Some(user_id) = filter.in_cart_of {
        push_list_membership(query, UserRecipeList::ShoppingCart, user_id);
    }
}
