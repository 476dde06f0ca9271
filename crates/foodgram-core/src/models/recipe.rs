// ABOUTME: Recipe models, list filters, and the aggregated shopping list
// ABOUTME: Recipe rows, validated drafts, per-user recipe lists, and shopping list rendering
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Stored recipe row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipe {
    /// Primary key
    pub id: i64,
    /// Author's user id
    pub author_id: i64,
    /// Title
    pub name: String,
    /// Picture path relative to the media root
    pub image: String,
    /// Description and steps
    pub text: String,
    /// Minutes
    pub cooking_time: i64,
    /// Slug used by short links
    pub short_code: String,
    /// Publication time
    pub pub_date: DateTime<Utc>,
}

/// Ingredient line of a recipe, joined with the catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeIngredientAmount {
    /// Ingredient id
    pub id: i64,
    /// Ingredient name
    pub name: String,
    /// Ingredient unit
    pub measurement_unit: String,
    /// Quantity in `measurement_unit`
    pub amount: i64,
}

/// Ingredient reference inside a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    /// Ingredient id
    pub ingredient_id: i64,
    /// Quantity
    pub amount: i64,
}

/// Validated recipe content ready to be written
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    /// Title
    pub name: String,
    /// Description
    pub text: String,
    /// Minutes
    pub cooking_time: i64,
    /// New picture path; `None` keeps the stored one on update
    pub image: Option<String>,
    /// Tag ids, unique
    pub tags: Vec<i64>,
    /// Ingredient lines, unique by ingredient
    pub ingredients: Vec<IngredientAmount>,
}

/// Filters for the recipe list
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Only recipes by this author
    pub author_id: Option<i64>,
    /// Recipes carrying any of these tag slugs
    pub tag_slugs: Vec<String>,
    /// Only recipes this user favorited
    pub favorited_by: Option<i64>,
    /// Only recipes in this user's shopping cart
    pub in_cart_of: Option<i64>,
}

/// Parse a boolean query flag (`1`/`0`/`true`/`false`)
///
/// # Errors
///
/// Returns a field error for any other value
pub fn parse_flag(field: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(AppError::invalid_field(field, "Enter a valid boolean.")),
    }
}

/// Per-user recipe collections backed by a `(user_id, recipe_id)` join table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRecipeList {
    /// Favorites
    Favorites,
    /// Shopping cart
    ShoppingCart,
}

impl UserRecipeList {
    /// Join table name
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping_cart",
        }
    }

    /// Name used in messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

/// One aggregated line of the shopping list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShoppingListItem {
    /// Ingredient name
    pub name: String,
    /// Ingredient unit
    pub measurement_unit: String,
    /// Sum of amounts across the cart
    pub total: i64,
}

impl Display for ShoppingListItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) — {}", self.name, self.measurement_unit, self.total)
    }
}

/// Render the plain-text export, one item per line
#[must_use]
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shopping_list() {
        let items = vec![
            ShoppingListItem {
                name: "flour".into(),
                measurement_unit: "g".into(),
                total: 700,
            },
            ShoppingListItem {
                name: "milk".into(),
                measurement_unit: "ml".into(),
                total: 250,
            },
        ];
        assert_eq!(
            render_shopping_list(&items),
            "flour (g) — 700\nmilk (ml) — 250"
        );
        assert_eq!(render_shopping_list(&[]), "");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("is_favorited", "1").unwrap());
        assert!(parse_flag("is_favorited", "True").unwrap());
        assert!(!parse_flag("is_favorited", "0").unwrap());
        assert!(parse_flag("is_favorited", "maybe").is_err());
    }

    #[test]
    fn test_list_tables() {
        assert_eq!(UserRecipeList::Favorites.table(), "favorites");
        assert_eq!(UserRecipeList::ShoppingCart.table(), "shopping_cart");
    }
}
