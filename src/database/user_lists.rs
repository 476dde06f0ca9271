// ABOUTME: Favorites and shopping cart database operations
// ABOUTME: Per-user recipe join tables and the aggregated shopping list query
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::collections::HashSet;

use chrono::Utc;
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{ShoppingListItem, UserRecipeList};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{format_timestamp, Database};

impl Database {
    /// Create the favorites and shopping cart tables
    pub(super) async fn migrate_user_lists(&self) -> AppResult<()> {
        for list in [UserRecipeList::Favorites, UserRecipeList::ShoppingCart] {
            let table = list.table();
            let create = format!(
                r"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    UNIQUE (user_id, recipe_id)
                )
                "
            );
            let index =
                format!("CREATE INDEX IF NOT EXISTS idx_{table}_recipe ON {table}(recipe_id)");
            self.execute_ddl(&[create.as_str(), index.as_str()]).await?;
        }
        Ok(())
    }

    /// Add a recipe to a user's list; `false` when it was already there
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails
    pub async fn add_to_list(
        &self,
        list: UserRecipeList,
        user_id: i64,
        recipe_id: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (user_id, recipe_id, created_at) VALUES ($1, $2, $3)",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add to {}: {e}", list.label())))?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a recipe from a user's list; `false` when it was not there
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails
    pub async fn remove_from_list(
        &self,
        list: UserRecipeList,
        user_id: i64,
        recipe_id: i64,
    ) -> AppResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            list.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to remove from {}: {e}", list.label()))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Which of `recipe_ids` are on a user's list
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn listed_recipe_ids(
        &self,
        list: UserRecipeList,
        user_id: i64,
        recipe_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT recipe_id FROM {} WHERE user_id = ",
            list.table()
        ));
        query.push_bind(user_id);
        query.push(" AND recipe_id IN (");
        let mut separated = query.separated(", ");
        for id in recipe_ids {
            separated.push_bind(*id);
        }
        query.push(")");

        let ids: Vec<i64> = query
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read {}: {e}", list.label())))?;
        Ok(ids.into_iter().collect())
    }

    /// Ingredient totals across every recipe in a user's cart, ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn shopping_list(&self, user_id: i64) -> AppResult<Vec<ShoppingListItem>> {
        let rows = sqlx::query(
            r"
            SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total
            FROM shopping_cart sc
            JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE sc.user_id = $1
            GROUP BY i.id, i.name, i.measurement_unit
            ORDER BY i.name, i.measurement_unit
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to build shopping list: {e}")))?;

        Ok(rows
            .iter()
            .map(|row| ShoppingListItem {
                name: row.get("name"),
                measurement_unit: row.get("measurement_unit"),
                total: row.get("total"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use foodgram_core::models::{IngredientAmount, RecipeDraft};

    use super::super::test_support::{create_test_db, create_user, seed_catalog};
    use super::*;

    async fn recipe_with(db: &Database, author_id: i64, tags: &[i64], lines: &[(i64, i64)]) -> i64 {
        db.create_recipe(
            author_id,
            &RecipeDraft {
                name: "Dish".to_owned(),
                text: "Cook it.".to_owned(),
                cooking_time: 10,
                image: Some("recipes/images/dish.png".to_owned()),
                tags: tags.to_vec(),
                ingredients: lines
                    .iter()
                    .map(|&(ingredient_id, amount)| IngredientAmount {
                        ingredient_id,
                        amount,
                    })
                    .collect(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_add_and_remove_are_idempotent_signals() {
        let db = create_test_db().await;
        let user = create_user(&db, "anna").await;
        let (tags, ingredients) = seed_catalog(&db).await;
        let recipe = recipe_with(&db, user.id, &tags, &[(ingredients[0], 1)]).await;

        let list = UserRecipeList::Favorites;
        assert!(db.add_to_list(list, user.id, recipe).await.unwrap());
        assert!(!db.add_to_list(list, user.id, recipe).await.unwrap());

        let listed = db.listed_recipe_ids(list, user.id, &[recipe, 999]).await.unwrap();
        assert!(listed.contains(&recipe));
        assert_eq!(listed.len(), 1);

        assert!(db.remove_from_list(list, user.id, recipe).await.unwrap());
        assert!(!db.remove_from_list(list, user.id, recipe).await.unwrap());
    }

    #[tokio::test]
    async fn test_lists_are_independent() {
        let db = create_test_db().await;
        let user = create_user(&db, "anna").await;
        let (tags, ingredients) = seed_catalog(&db).await;
        let recipe = recipe_with(&db, user.id, &tags, &[(ingredients[0], 1)]).await;

        db.add_to_list(UserRecipeList::ShoppingCart, user.id, recipe)
            .await
            .unwrap();
        assert!(db
            .listed_recipe_ids(UserRecipeList::Favorites, user.id, &[recipe])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_shopping_list_sums_amounts() {
        let db = create_test_db().await;
        let user = create_user(&db, "anna").await;
        let (tags, ingredients) = seed_catalog(&db).await;
        // ingredients are ordered by name: eggs, flour, milk
        let (eggs, flour, milk) = (ingredients[0], ingredients[1], ingredients[2]);

        let pancakes = recipe_with(&db, user.id, &tags, &[(flour, 200), (milk, 300), (eggs, 2)]).await;
        let bread = recipe_with(&db, user.id, &tags, &[(flour, 500)]).await;
        let ignored = recipe_with(&db, user.id, &tags, &[(milk, 1000)]).await;

        for recipe in [pancakes, bread] {
            db.add_to_list(UserRecipeList::ShoppingCart, user.id, recipe)
                .await
                .unwrap();
        }
        db.add_to_list(UserRecipeList::Favorites, user.id, ignored)
            .await
            .unwrap();

        let items = db.shopping_list(user.id).await.unwrap();
        let lines: Vec<_> = items.iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec!["eggs (pcs) — 2", "flour (g) — 700", "milk (ml) — 300"]);

        let other = create_user(&db, "bob").await;
        assert!(db.shopping_list(other.id).await.unwrap().is_empty());
    }
}
