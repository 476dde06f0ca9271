// ABOUTME: SQLite connection pool, schema migrations, and shared row helpers
// ABOUTME: Operations for each table live in submodules as further impl Database blocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! # Database Management
//!
//! SQLite storage for accounts, tokens, the tag and ingredient catalog,
//! recipes, and the per-user favorite, cart, and follow lists. Operations
//! are split across submodules as further `impl Database` blocks.

mod follows;
mod ingredients;
mod recipes;
mod tags;
mod tokens;
mod user_lists;
mod users;

pub use ingredients::ImportReport;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use foodgram_core::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tokio::fs;
use tracing::{debug, info};

/// Database manager for every persistent table
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect, creating the file if needed, and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL '{database_url}': {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let pool = if in_memory {
            // Every connection to `:memory:` is a separate database, so keep exactly one alive
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            if let Some(parent) = options.get_filename().parent() {
                ensure_directory(parent).await?;
            }
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await
        }
        .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(in_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE` statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_tokens().await?;
        self.migrate_tags().await?;
        self.migrate_ingredients().await?;
        self.migrate_recipes().await?;
        self.migrate_user_lists().await?;
        self.migrate_follows().await?;
        debug!("Migrations applied");
        Ok(())
    }

    /// Run a batch of DDL statements in order
    async fn execute_ddl(&self, statements: &[&str]) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }
}

async fn ensure_directory(path: &Path) -> AppResult<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).await.map_err(|e| {
        AppError::database(format!(
            "Failed to create database directory {}: {e}",
            path.display()
        ))
    })
}

/// Fixed-width UTC timestamp so text ordering matches time ordering
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid timestamp '{raw}': {e}")))
}

/// Whether an insert failed on a `UNIQUE` or `PRIMARY KEY` constraint
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_are_fixed_width() {
        let a = format_timestamp(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let b = format_timestamp(DateTime::from_timestamp(1_700_000_000, 123_000).unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&b).unwrap().timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = test_support::create_test_db().await;
        db.migrate().await.unwrap();
    }
}
