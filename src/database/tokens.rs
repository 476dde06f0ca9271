// ABOUTME: Auth token registry database operations
// ABOUTME: Records issued token ids so logout can revoke them before expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use chrono::{DateTime, Utc};
use foodgram_core::errors::{AppError, AppResult};

use super::{format_timestamp, Database};

impl Database {
    /// Create the token registry table
    pub(super) async fn migrate_tokens(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS auth_tokens (
                jti TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens(user_id)",
        ])
        .await
    }

    /// Record an issued token
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails
    pub async fn store_token(
        &self,
        jti: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO auth_tokens (jti, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(jti)
        .bind(user_id)
        .bind(format_timestamp(Utc::now()))
        .bind(format_timestamp(expires_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store auth token: {e}")))?;
        Ok(())
    }

    /// Whether a token id is registered to this user and not yet expired
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn is_token_active(&self, jti: &str, user_id: i64) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM auth_tokens
                WHERE jti = $1 AND user_id = $2 AND expires_at > $3
            )
            ",
        )
        .bind(jti)
        .bind(user_id)
        .bind(format_timestamp(Utc::now()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check auth token: {e}")))
    }

    /// Revoke a token; returns whether it was registered
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails
    pub async fn revoke_token(&self, jti: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE jti = $1")
            .bind(jti)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to revoke auth token: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop expired registry rows, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails
    pub async fn purge_expired_tokens(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= $1")
            .bind(format_timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to purge auth tokens: {e}")))?;
        Ok(result.rows_affected())
    }
}
