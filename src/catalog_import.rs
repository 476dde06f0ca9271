// ABOUTME: Loads the tag and ingredient catalogs from JSON files
// ABOUTME: Validates every entry before inserting and reports rows that already existed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! Catalog import
//!
//! The catalog is read-only through the API, so tags and ingredients arrive
//! through these loaders (driven by `foodgram-cli`). A file is validated as a
//! whole: one bad entry rejects the file and nothing is written.

use std::path::Path;

use foodgram_core::constants::limits::{
    INGREDIENT_NAME_MAX_LEN, MEASUREMENT_UNIT_MAX_LEN, TAG_NAME_MAX_LEN, TAG_SLUG_MAX_LEN,
};
use foodgram_core::errors::{AppError, AppResult};
use foodgram_core::models::{NewIngredient, NewTag, Tag};
use foodgram_core::validation::{is_valid_slug, ValidationErrors};
use serde::Deserialize;
use tokio::fs;

use crate::database::{Database, ImportReport};
use crate::logging::AppLogger;

#[derive(Debug, Deserialize)]
struct RawIngredient {
    name: Option<String>,
    measurement_unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    name: Option<String>,
    slug: Option<String>,
}

/// Parse and validate an ingredient list: `[{"name": ..., "measurement_unit": ...}]`
///
/// # Errors
///
/// Returns a serialization error for malformed JSON and a validation error
/// naming each invalid entry by index
pub fn parse_ingredients(json: &str) -> AppResult<Vec<NewIngredient>> {
    let raw: Vec<RawIngredient> = serde_json::from_str(json)?;
    let mut errors = ValidationErrors::new();
    let mut items = Vec::with_capacity(raw.len());

    for (index, entry) in raw.iter().enumerate() {
        let name = errors.text(
            &format!("[{index}].name"),
            entry.name.as_deref(),
            INGREDIENT_NAME_MAX_LEN,
        );
        let unit = errors.text(
            &format!("[{index}].measurement_unit"),
            entry.measurement_unit.as_deref(),
            MEASUREMENT_UNIT_MAX_LEN,
        );
        if let (Some(name), Some(measurement_unit)) = (name, unit) {
            items.push(NewIngredient {
                name,
                measurement_unit,
            });
        }
    }

    errors.into_result()?;
    Ok(items)
}

/// Parse and validate a tag list: `[{"name": ..., "slug": ...}]`
///
/// # Errors
///
/// Returns a serialization error for malformed JSON and a validation error
/// naming each invalid entry by index
pub fn parse_tags(json: &str) -> AppResult<Vec<NewTag>> {
    let raw: Vec<RawTag> = serde_json::from_str(json)?;
    let mut errors = ValidationErrors::new();
    let mut tags = Vec::with_capacity(raw.len());

    for (index, entry) in raw.iter().enumerate() {
        if let Some(tag) = check_tag(
            &mut errors,
            &format!("[{index}]."),
            entry.name.as_deref(),
            entry.slug.as_deref(),
        ) {
            tags.push(tag);
        }
    }

    errors.into_result()?;
    Ok(tags)
}

fn check_tag(
    errors: &mut ValidationErrors,
    prefix: &str,
    name: Option<&str>,
    slug: Option<&str>,
) -> Option<NewTag> {
    let name = errors.text(&format!("{prefix}name"), name, TAG_NAME_MAX_LEN);
    let slug_field = format!("{prefix}slug");
    let slug = errors
        .text(&slug_field, slug, TAG_SLUG_MAX_LEN)
        .and_then(|slug| {
            if is_valid_slug(&slug) {
                Some(slug)
            } else {
                errors.add(
                    &slug_field,
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                );
                None
            }
        });
    Some(NewTag {
        name: name?,
        slug: slug?,
    })
}

async fn read_catalog_file(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).await.map_err(|e| {
        AppError::storage(format!("Failed to read {}: {e}", path.display())).with_source(e)
    })
}

/// Load ingredients from a JSON file, skipping (name, unit) pairs already present
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, contains
/// an invalid entry, or the insert fails
pub async fn load_ingredients_file(db: &Database, path: &Path) -> AppResult<ImportReport> {
    let items = parse_ingredients(&read_catalog_file(path).await?)?;
    let report = db.import_ingredients(&items).await?;
    AppLogger::log_import("ingredients", report.added, report.skipped.len());
    Ok(report)
}

/// Load tags from a JSON file, skipping names or slugs already present
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, contains
/// an invalid entry, or the insert fails
pub async fn load_tags_file(db: &Database, path: &Path) -> AppResult<ImportReport> {
    let tags = parse_tags(&read_catalog_file(path).await?)?;
    let report = db.import_tags(&tags).await?;
    AppLogger::log_import("tags", report.added, report.skipped.len());
    Ok(report)
}

/// Create a single tag
///
/// # Errors
///
/// Returns a validation error for a bad name or slug, and `ResourceAlreadyExists`
/// if either is taken
pub async fn create_tag(db: &Database, name: &str, slug: &str) -> AppResult<Tag> {
    let mut errors = ValidationErrors::new();
    let tag = check_tag(&mut errors, "", Some(name), Some(slug));
    errors.into_result()?;
    let tag = tag.ok_or_else(|| AppError::internal("Tag validation produced no value"))?;
    db.create_tag(&tag).await
}

#[cfg(test)]
mod tests {
    use std::fs as std_fs;

    use foodgram_core::errors::ErrorCode;
    use tempfile::TempDir;

    use super::*;

    async fn create_test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[test]
    fn test_parse_ingredients_trims_values() {
        let items =
            parse_ingredients(r#"[{"name": " flour ", "measurement_unit": "g"}]"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "flour");
        assert_eq!(items[0].measurement_unit, "g");
    }

    #[test]
    fn test_parse_ingredients_reports_entry_index() {
        let err = parse_ingredients(
            r#"[{"name": "flour", "measurement_unit": "g"}, {"name": "", "measurement_unit": "ml"}]"#,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.field_errors.contains_key("[1].name"));
        assert!(!err.field_errors.contains_key("[0].name"));
    }

    #[test]
    fn test_parse_tags_rejects_bad_slug() {
        let err = parse_tags(r#"[{"name": "Lunch", "slug": "обед"}]"#).unwrap_err();
        assert!(err.field_errors.contains_key("[0].slug"));
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_tags("{not json").unwrap_err();
        assert_eq!(err.code, ErrorCode::SerializationError);
    }

    #[tokio::test]
    async fn test_load_ingredients_file_skips_existing() {
        let db = create_test_db().await;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ingredients.json");
        std_fs::write(
            &path,
            r#"[{"name": "salt", "measurement_unit": "g"}, {"name": "water", "measurement_unit": "ml"}]"#,
        )
        .unwrap();

        let first = load_ingredients_file(&db, &path).await.unwrap();
        assert_eq!(first.added, 2);
        assert!(first.skipped.is_empty());

        let second = load_ingredients_file(&db, &path).await.unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_load_tags_file_missing_file() {
        let db = create_test_db().await;
        let err = load_tags_file(&db, Path::new("/nonexistent/tags.json"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageError);
    }

    #[tokio::test]
    async fn test_create_tag_validates_and_rejects_duplicates() {
        let db = create_test_db().await;
        let tag = create_tag(&db, "Breakfast", "breakfast").await.unwrap();
        assert_eq!(tag.slug, "breakfast");

        let duplicate = create_tag(&db, "Breakfast", "morning").await.unwrap_err();
        assert_eq!(duplicate.code, ErrorCode::ResourceAlreadyExists);

        let invalid = create_tag(&db, "", "bad slug").await.unwrap_err();
        assert!(invalid.field_errors.contains_key("name"));
        assert!(invalid.field_errors.contains_key("slug"));
    }
}
