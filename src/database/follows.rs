// ABOUTME: Follow (subscription) database operations
// ABOUTME: Self-referential user join table with a no-self-follow constraint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::User;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{format_timestamp, Database};

impl Database {
    /// Create the follows table
    pub(super) async fn migrate_follows(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, author_id),
                CHECK (user_id <> author_id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_follows_author ON follows(author_id)",
        ])
        .await
    }

    /// Follow an author; `false` when already following
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on a self-follow, or a database error
    pub async fn follow(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        if user_id == author_id {
            return Err(AppError::invalid_input("You cannot subscribe to yourself."));
        }
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (user_id, author_id, created_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to follow author: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Stop following an author; `false` when not following
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails
    pub async fn unfollow(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to unfollow author: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Which of `author_ids` the user follows
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn followed_author_ids(
        &self,
        user_id: i64,
        author_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut query =
            QueryBuilder::<Sqlite>::new("SELECT author_id FROM follows WHERE user_id = ");
        query.push_bind(user_id);
        query.push(" AND author_id IN (");
        let mut separated = query.separated(", ");
        for id in author_ids {
            separated.push_bind(*id);
        }
        query.push(")");

        let ids = query
            .build_query_scalar::<i64>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to read follows: {e}")))?;
        Ok(ids.into_iter().collect())
    }

    /// Page of authors the user follows, ordered by username
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_followed_authors(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<User>> {
        let rows = sqlx::query(
            r"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.password_hash,
                   u.avatar, u.is_active, u.date_joined
            FROM follows f JOIN users u ON u.id = f.author_id
            WHERE f.user_id = $1
            ORDER BY u.username
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list subscriptions: {e}")))?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Number of authors the user follows
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_followed_authors(&self, user_id: i64) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count subscriptions: {e}")))
    }

    /// Recipe counts per author; authors without recipes are absent
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_counts(&self, author_ids: &[i64]) -> AppResult<HashMap<i64, i64>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT author_id, COUNT(*) AS recipes_count FROM recipes WHERE author_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in author_ids {
            separated.push_bind(*id);
        }
        query.push(") GROUP BY author_id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count recipes: {e}")))?;
        Ok(rows
            .iter()
            .map(|row| (row.get("author_id"), row.get("recipes_count")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{create_test_db, create_user};
    use super::*;

    #[tokio::test]
    async fn test_follow_rules() {
        let db = create_test_db().await;
        let anna = create_user(&db, "anna").await;
        let bob = create_user(&db, "bob").await;

        assert!(db.follow(anna.id, bob.id).await.unwrap());
        assert!(!db.follow(anna.id, bob.id).await.unwrap());
        assert!(db.follow(anna.id, anna.id).await.is_err());

        let followed = db.followed_author_ids(anna.id, &[bob.id, anna.id]).await.unwrap();
        assert_eq!(followed.into_iter().collect::<Vec<_>>(), vec![bob.id]);

        assert!(db.unfollow(anna.id, bob.id).await.unwrap());
        assert!(!db.unfollow(anna.id, bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_rejected_by_schema() {
        let db = create_test_db().await;
        let anna = create_user(&db, "anna").await;

        let raw = sqlx::query(
            "INSERT INTO follows (user_id, author_id, created_at) VALUES ($1, $1, 'now')",
        )
        .bind(anna.id)
        .execute(db.pool())
        .await;
        assert!(raw.is_err());
    }

    #[tokio::test]
    async fn test_followed_authors_sorted_by_username() {
        let db = create_test_db().await;
        let reader = create_user(&db, "reader").await;
        let zed = create_user(&db, "zed").await;
        let amy = create_user(&db, "amy").await;
        db.follow(reader.id, zed.id).await.unwrap();
        db.follow(reader.id, amy.id).await.unwrap();

        let authors = db.list_followed_authors(reader.id, 10, 0).await.unwrap();
        let names: Vec<_> = authors.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["amy", "zed"]);
        assert_eq!(db.count_followed_authors(reader.id).await.unwrap(), 2);
        assert!(db.recipe_counts(&[zed.id]).await.unwrap().is_empty());
    }
}
