// ABOUTME: Core types and constants for the Foodgram recipe-sharing API
// ABOUTME: Foundation crate with error handling, pagination, validation, and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

#![deny(unsafe_code)]

//! # Foodgram Core
//!
//! Foundation crate providing shared types and constants for the Foodgram
//! server. It holds everything that does not need a database or an HTTP
//! stack, so it changes rarely and compiles once.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Field limits, pagination defaults, and media locations
//! - **pagination**: Page-number pagination with `count/next/previous/results` envelopes
//! - **validation**: Field-level validation error collection
//! - **models**: Users, tags, ingredients, recipes, and shopping-list rows
//! - **short_code**: Shareable recipe slugs

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Page-number pagination for list endpoints
pub mod pagination;

/// Field-level validation helpers
pub mod validation;

/// Core data models
pub mod models;

/// Short code generation for shareable recipe links
pub mod short_code;
