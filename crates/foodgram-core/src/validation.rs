// ABOUTME: Field-level validation helpers shared by request handlers
// ABOUTME: Collects per-field messages and checks text lengths, ranges, emails, usernames and slugs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{AppError, AppResult};

/// Message used when a required field is absent or blank
pub const REQUIRED: &str = "This field is required.";

/// Accumulates validation messages so a client sees every problem at once
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Whether no message has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether a field already has a message
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Consume into the raw field map
    #[must_use]
    pub fn into_fields(self) -> BTreeMap<String, Vec<String>> {
        self.fields
    }

    /// `Ok(())` when empty, otherwise a validation `AppError`
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error carrying every collected message
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self))
        }
    }

    /// Require non-blank text no longer than `max_len` characters
    ///
    /// Returns the trimmed value when valid.
    pub fn text(&mut self, field: &str, value: Option<&str>, max_len: usize) -> Option<String> {
        let Some(trimmed) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.add(field, REQUIRED);
            return None;
        };
        if trimmed.chars().count() > max_len {
            self.add(
                field,
                format!("Ensure this field has no more than {max_len} characters."),
            );
            return None;
        }
        Some(trimmed.to_owned())
    }

    /// Require an integer within `min..=max`
    pub fn range(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) -> Option<i64> {
        match value {
            None => {
                self.add(field, REQUIRED);
                None
            }
            Some(v) if v < min => {
                self.add(
                    field,
                    format!("Ensure this value is greater than or equal to {min}."),
                );
                None
            }
            Some(v) if v > max => {
                self.add(
                    field,
                    format!("Ensure this value is less than or equal to {max}."),
                );
                None
            }
            Some(v) => Some(v),
        }
    }
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Username characters: letters, digits and `.@+-_`
#[must_use]
pub fn is_valid_username(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^[\w.@+-]+$").is_some_and(|re| re.is_match(value))
}

/// Loose structural email check: one `@`, no whitespace, a dot in the domain
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_some_and(|re| re.is_match(value))
}

/// Slug characters: ASCII letters, digits, `-` and `_`
#[must_use]
pub fn is_valid_slug(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&RE, r"^[-a-zA-Z0-9_]+$").is_some_and(|re| re.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_rules() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.text("name", Some("  Soup "), 10), Some("Soup".to_owned()));
        assert_eq!(errors.text("blank", Some("   "), 10), None);
        assert_eq!(errors.text("long", Some("abcdef"), 3), None);
        assert_eq!(errors.text("missing", None, 3), None);

        assert!(!errors.has("name"));
        assert!(errors.has("blank"));
        assert!(errors.has("long"));
        assert!(errors.has("missing"));
    }

    #[test]
    fn test_range_rules() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.range("cooking_time", Some(1), 1, 480), Some(1));
        assert_eq!(errors.range("low", Some(0), 1, 480), None);
        assert_eq!(errors.range("high", Some(481), 1, 480), None);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_patterns() {
        assert!(is_valid_username("chef.anna+1@home"));
        assert!(!is_valid_username("bad name"));
        assert!(is_valid_email("cook@example.com"));
        assert!(!is_valid_email("cook@@example.com"));
        assert!(!is_valid_email("cook example.com"));
        assert!(is_valid_slug("breakfast_2"));
        assert!(!is_valid_slug("завтрак"));
    }
}
