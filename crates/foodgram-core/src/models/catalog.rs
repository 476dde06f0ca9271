// ABOUTME: Tag and ingredient catalog models
// ABOUTME: Admin-managed reference data recipes point at
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use serde::{Deserialize, Serialize};

/// Recipe label such as "Breakfast"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Primary key
    pub id: i64,
    /// Display name, unique
    pub name: String,
    /// URL-safe identifier used by the `tags` filter, unique
    pub slug: String,
}

/// Tag import record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTag {
    /// Display name
    pub name: String,
    /// URL-safe identifier
    pub slug: String,
}

/// Ingredient with its measurement unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ingredient {
    /// Primary key
    pub id: i64,
    /// Name, unique together with the unit
    pub name: String,
    /// Unit amounts are counted in, e.g. "g"
    pub measurement_unit: String,
}

/// Ingredient import record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewIngredient {
    /// Name
    pub name: String,
    /// Unit amounts are counted in
    pub measurement_unit: String,
}
