// ABOUTME: User account model
// ABOUTME: Stored account row and the data needed to register a new account
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Primary key
    pub id: i64,
    /// Login email, unique
    pub email: String,
    /// Public handle, unique
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Bcrypt hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Avatar path relative to the media root
    pub avatar: Option<String>,
    /// Inactive accounts cannot authenticate
    pub is_active: bool,
    /// Registration time
    pub date_joined: DateTime<Utc>,
}

/// Validated registration data with the password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email
    pub email: String,
    /// Public handle
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Bcrypt hash
    pub password_hash: String,
}
