// ABOUTME: Tag catalog database operations
// ABOUTME: Listing, lookup, creation, and bulk import of recipe tags
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{NewTag, Tag};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{is_unique_violation, Database, ImportReport};

impl Database {
    /// Create tag tables
    pub(super) async fn migrate_tags(&self) -> AppResult<()> {
        self.execute_ddl(&[r"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL UNIQUE
            )
            "])
        .await
    }

    /// All tags ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, slug FROM tags ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list tags: {e}")))?;
        Ok(rows.iter().map(Self::row_to_tag).collect())
    }

    /// Get a tag by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_tag(&self, tag_id: i64) -> AppResult<Option<Tag>> {
        let row = sqlx::query("SELECT id, name, slug FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get tag: {e}")))?;
        Ok(row.as_ref().map(Self::row_to_tag))
    }

    /// Create a tag
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the name or slug is taken
    pub async fn create_tag(&self, tag: &NewTag) -> AppResult<Tag> {
        let result = sqlx::query("INSERT INTO tags (name, slug) VALUES ($1, $2)")
            .bind(&tag.name)
            .bind(&tag.slug)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::already_exists(format!(
                        "Tag with name '{}' or slug '{}' already exists",
                        tag.name, tag.slug
                    ))
                } else {
                    AppError::database(format!("Failed to create tag: {e}"))
                }
            })?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        })
    }

    /// Insert tags, skipping ones whose name or slug already exists
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails
    pub async fn import_tags(&self, tags: &[NewTag]) -> AppResult<ImportReport> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let mut report = ImportReport::default();
        for tag in tags {
            let result = sqlx::query("INSERT OR IGNORE INTO tags (name, slug) VALUES ($1, $2)")
                .bind(&tag.name)
                .bind(&tag.slug)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to import tag: {e}")))?;
            if result.rows_affected() == 0 {
                report.skipped.push(format!("{} ({})", tag.name, tag.slug));
            } else {
                report.added += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit tag import: {e}")))?;
        Ok(report)
    }

    /// The subset of `ids` that exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn existing_tag_ids(&self, ids: &[i64]) -> AppResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM tags WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(")");

        query
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check tags: {e}")))
    }

    pub(super) fn row_to_tag(row: &SqliteRow) -> Tag {
        Tag {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use foodgram_core::errors::ErrorCode;

    use super::super::test_support::create_test_db;
    use super::*;

    fn tag(name: &str, slug: &str) -> NewTag {
        NewTag {
            name: name.to_owned(),
            slug: slug.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_tags_are_sorted_and_unique() {
        let db = create_test_db().await;
        db.create_tag(&tag("Lunch", "lunch")).await.unwrap();
        db.create_tag(&tag("Breakfast", "breakfast")).await.unwrap();

        let names: Vec<_> = db
            .list_tags()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Breakfast", "Lunch"]);

        let err = db.create_tag(&tag("Other", "lunch")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
    }

    #[tokio::test]
    async fn test_import_skips_existing() {
        let db = create_test_db().await;
        db.create_tag(&tag("Lunch", "lunch")).await.unwrap();

        let report = db
            .import_tags(&[tag("Lunch", "lunch"), tag("Dinner", "dinner")])
            .await
            .unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.skipped, vec!["Lunch (lunch)"]);
    }

    #[tokio::test]
    async fn test_existing_tag_ids() {
        let db = create_test_db().await;
        let lunch = db.create_tag(&tag("Lunch", "lunch")).await.unwrap();

        let found = db.existing_tag_ids(&[lunch.id, 999]).await.unwrap();
        assert_eq!(found, vec![lunch.id]);
        assert!(db.existing_tag_ids(&[]).await.unwrap().is_empty());
    }
}
