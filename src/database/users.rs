// ABOUTME: User management database operations
// ABOUTME: Handles registration, lookup, listing, password changes, and avatars

use std::collections::HashMap;

use chrono::Utc;
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{NewUser, User};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::{format_timestamp, is_unique_violation, parse_timestamp, Database};

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password_hash, avatar, is_active, date_joined";

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                avatar TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
        ])
        .await
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns a field error if the email or username is taken, or a database
    /// error if the insert fails
    pub async fn create_user(&self, user: &NewUser) -> AppResult<User> {
        if self.email_taken(&user.email).await? {
            return Err(AppError::already_exists("A user with that email already exists.")
                .with_field("email", "A user with that email already exists."));
        }
        if self.username_taken(&user.username).await? {
            return Err(
                AppError::already_exists("A user with that username already exists.")
                    .with_field("username", "A user with that username already exists."),
            );
        }

        let result = sqlx::query(
            r"
            INSERT INTO users (email, username, first_name, last_name, password_hash, date_joined)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration
            if is_unique_violation(&e) {
                AppError::already_exists("A user with that email or username already exists.")
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        self.get_user(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::internal("Created user could not be read back"))
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check email: {e}")))
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check username: {e}")))
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Users keyed by id; unknown ids are absent
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_users(&self, user_ids: &[i64]) -> AppResult<HashMap<i64, User>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in user_ids {
            separated.push_bind(*id);
        }
        query.push(")");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get users: {e}")))?;

        rows.iter()
            .map(|row| Self::row_to_user(row).map(|user| (user.id, user)))
            .collect()
    }

    /// Get a user by login email
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Page of users ordered by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_users(&self, limit: i64, offset: i64) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list users: {e}")))?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Total number of users
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn count_users(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))
    }

    /// Replace a user's password hash
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn update_password(&self, user_id: i64, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update password: {e}")))?;
        Ok(())
    }

    /// Set or clear the avatar path, returning the previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails
    pub async fn set_avatar(&self, user_id: i64, avatar: Option<&str>) -> AppResult<Option<String>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT avatar FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to read avatar: {e}")))?
                .flatten();

        sqlx::query("UPDATE users SET avatar = $1 WHERE id = $2")
            .bind(avatar)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update avatar: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit avatar update: {e}")))?;
        Ok(previous)
    }

    pub(super) fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let date_joined: String = row.get("date_joined");
        Ok(User {
            id: row.get("id"),
            email: row.get("email"),
            username: row.get("username"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            password_hash: row.get("password_hash"),
            avatar: row.get("avatar"),
            is_active: row.get("is_active"),
            date_joined: parse_timestamp(&date_joined)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use foodgram_core::errors::ErrorCode;

    use super::super::test_support::{create_test_db, create_user};
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let db = create_test_db().await;
        let user = create_user(&db, "anna").await;

        assert_eq!(user.username, "anna");
        assert!(user.is_active);
        assert!(user.avatar.is_none());

        let by_email = db.get_user_by_email("anna@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_field_error() {
        let db = create_test_db().await;
        create_user(&db, "anna").await;

        let err = db
            .create_user(&NewUser {
                email: "anna@example.com".to_owned(),
                username: "other".to_owned(),
                first_name: "A".to_owned(),
                last_name: "B".to_owned(),
                password_hash: "x".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceAlreadyExists);
        assert!(err.field_errors.contains_key("email"));
    }

    #[tokio::test]
    async fn test_set_avatar_returns_previous() {
        let db = create_test_db().await;
        let user = create_user(&db, "anna").await;

        assert_eq!(db.set_avatar(user.id, Some("users/avatars/a.png")).await.unwrap(), None);
        let previous = db.set_avatar(user.id, None).await.unwrap();
        assert_eq!(previous.as_deref(), Some("users/avatars/a.png"));
    }

    #[tokio::test]
    async fn test_get_users_by_ids() {
        let db = create_test_db().await;
        let anna = create_user(&db, "anna").await;
        let bob = create_user(&db, "bob").await;

        let users = db.get_users(&[anna.id, bob.id, 999]).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[&bob.id].username, "bob");
        assert!(db.get_users(&[]).await.unwrap().is_empty());
    }
}
