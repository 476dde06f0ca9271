// ABOUTME: Ingredient catalog database operations
// ABOUTME: Prefix search, lookup, and bulk import of ingredients with measurement units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{Ingredient, NewIngredient};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::Database;

/// Outcome of a catalog import
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows inserted
    pub added: usize,
    /// Human readable labels of rows that already existed
    pub skipped: Vec<String>,
}

impl Database {
    /// Create ingredient tables
    ///
    /// `search_name` holds the lowercased name because SQLite's `LIKE` and
    /// `lower()` only fold ASCII.
    pub(super) async fn migrate_ingredients(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                measurement_unit TEXT NOT NULL,
                search_name TEXT NOT NULL,
                UNIQUE (name, measurement_unit)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_ingredients_search_name ON ingredients(search_name)",
        ])
        .await
    }

    /// Ingredients ordered by name, optionally filtered by a case-insensitive name prefix
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_ingredients(&self, name_prefix: Option<&str>) -> AppResult<Vec<Ingredient>> {
        let prefix = name_prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase);

        let rows = match prefix {
            Some(prefix) => {
                sqlx::query(
                    r"
                    SELECT id, name, measurement_unit FROM ingredients
                    WHERE substr(search_name, 1, length($1)) = $1
                    ORDER BY name, id
                    ",
                )
                .bind(prefix)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to list ingredients: {e}")))?;

        Ok(rows.iter().map(Self::row_to_ingredient).collect())
    }

    /// Get an ingredient by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_ingredient(&self, ingredient_id: i64) -> AppResult<Option<Ingredient>> {
        let row = sqlx::query("SELECT id, name, measurement_unit FROM ingredients WHERE id = $1")
            .bind(ingredient_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get ingredient: {e}")))?;
        Ok(row.as_ref().map(Self::row_to_ingredient))
    }

    /// Insert ingredients, skipping `(name, measurement_unit)` pairs that already exist
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn import_ingredients(&self, items: &[NewIngredient]) -> AppResult<ImportReport> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let mut report = ImportReport::default();
        for item in items {
            let result = sqlx::query(
                r"
                INSERT OR IGNORE INTO ingredients (name, measurement_unit, search_name)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(&item.name)
            .bind(&item.measurement_unit)
            .bind(item.name.to_lowercase())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to import ingredient: {e}")))?;

            if result.rows_affected() == 0 {
                report
                    .skipped
                    .push(format!("{} ({})", item.name, item.measurement_unit));
            } else {
                report.added += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit ingredient import: {e}")))?;
        Ok(report)
    }

    /// The subset of `ids` that exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn existing_ingredient_ids(&self, ids: &[i64]) -> AppResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM ingredients WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(")");

        query
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check ingredients: {e}")))
    }

    fn row_to_ingredient(row: &SqliteRow) -> Ingredient {
        Ingredient {
            id: row.get("id"),
            name: row.get("name"),
            measurement_unit: row.get("measurement_unit"),
        }
    }
}
