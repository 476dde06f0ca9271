// ABOUTME: Core data models for users, the tag/ingredient catalog, and recipes
// ABOUTME: Plain data shared between the database layer and the HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! # Data Models
//!
//! Rows as stored by the database layer. HTTP representations live next to
//! the routes that produce them, so these types never decide JSON shape for
//! clients on their own.

mod catalog;
mod recipe;
mod user;

pub use catalog::{Ingredient, NewIngredient, NewTag, Tag};
pub use recipe::{
    parse_flag, render_shopping_list, IngredientAmount, Recipe, RecipeDraft, RecipeFilter,
    RecipeIngredientAmount, ShoppingListItem, UserRecipeList,
};
pub use user::{NewUser, User};
