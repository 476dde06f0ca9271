// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Field limits, pagination defaults, media locations, and service identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! Constants grouped by domain.

/// Service identification
pub mod service_names {
    /// Name reported by logs and the health endpoint
    pub const FOODGRAM_SERVER: &str = "foodgram-server";
}

/// Network defaults
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8000;
}

/// Pagination defaults
pub mod pagination {
    /// Page size when the client does not send `limit`
    pub const DEFAULT_PAGE_SIZE: u32 = 6;
    /// Largest accepted `limit`
    pub const MAX_PAGE_SIZE: u32 = 100;
    /// Query parameter holding the page number
    pub const PAGE_PARAM: &str = "page";
    /// Query parameter holding the page size
    pub const LIMIT_PARAM: &str = "limit";
}

/// Maximum lengths and numeric bounds for user input
pub mod limits {
    /// Email length
    pub const EMAIL_MAX_LEN: usize = 254;
    /// Username length
    pub const USERNAME_MAX_LEN: usize = 150;
    /// First and last name length
    pub const PERSON_NAME_MAX_LEN: usize = 150;
    /// Password length
    pub const PASSWORD_MAX_LEN: usize = 128;
    /// Tag name length
    pub const TAG_NAME_MAX_LEN: usize = 32;
    /// Tag slug length
    pub const TAG_SLUG_MAX_LEN: usize = 32;
    /// Ingredient name length
    pub const INGREDIENT_NAME_MAX_LEN: usize = 128;
    /// Measurement unit length
    pub const MEASUREMENT_UNIT_MAX_LEN: usize = 64;
    /// Recipe name length
    pub const RECIPE_NAME_MAX_LEN: usize = 256;
    /// Minimum cooking time in minutes
    pub const MIN_COOKING_TIME: i64 = 1;
    /// Maximum cooking time in minutes
    pub const MAX_COOKING_TIME: i64 = 480;
    /// Minimum ingredient amount
    pub const MIN_AMOUNT: i64 = 1;
    /// Maximum ingredient amount
    pub const MAX_AMOUNT: i64 = 1000;
    /// Usernames that collide with route segments
    pub const RESERVED_USERNAMES: &[&str] = &["me"];
}

/// Media storage locations, relative to the media root
pub mod media {
    /// Recipe pictures
    pub const RECIPE_IMAGES: &str = "recipes/images";
    /// User avatars
    pub const USER_AVATARS: &str = "users/avatars";
    /// Accepted image extensions in data URIs
    pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
}

/// Shopping list export
pub mod shopping_list {
    /// File name offered to the browser
    pub const FILE_NAME: &str = "shopping_cart.txt";
}

/// Short link settings
pub mod short_links {
    /// Route prefix for short links
    pub const PREFIX: &str = "/s";
    /// Frontend page a resolved short link points at (recipe id is appended)
    pub const RECIPE_PAGE_PREFIX: &str = "/recipes/";
    /// Frontend page for unknown short codes
    pub const NOT_FOUND_PAGE: &str = "/404/";
    /// Generation attempts before giving up on a unique code
    pub const MAX_GENERATION_ATTEMPTS: usize = 5;
}

/// Authentication
pub mod auth {
    /// Default token lifetime in hours (30 days)
    pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 720;
    /// Authorization scheme used by the web client
    pub const TOKEN_SCHEME: &str = "Token";
    /// Authorization scheme accepted for API tools
    pub const BEARER_SCHEME: &str = "Bearer";
    /// Message for failed logins
    pub const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";
}
