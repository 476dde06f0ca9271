// ABOUTME: Uploaded image storage for recipe pictures and user avatars
// ABOUTME: Decodes base64 data URIs, writes files under the media root, and builds public URLs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Foodgram Contributors

//! # Media Storage
//!
//! Clients upload images inline as `data:image/<ext>;base64,<payload>`.
//! Files are stored as `<root>/<kind>/<uuid>.<ext>` and referenced in the
//! database by the path relative to the root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use foodgram_core::constants::media::ALLOWED_IMAGE_EXTENSIONS;
use foodgram_core::errors::{AppError, AppResult};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MediaConfig;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// An image decoded from a data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Normalized file extension
    pub extension: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// Decode `data:image/<ext>;base64,<payload>`
///
/// # Errors
///
/// Returns an `InvalidInput` error on `field` if the URI is malformed, the
/// extension is not an allowed image type, or the payload is empty
pub fn decode_data_uri(field: &str, raw: &str) -> AppResult<DecodedImage> {
    let invalid = || AppError::invalid_field(field, INVALID_IMAGE);

    let (header, payload) = raw
        .trim()
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .ok_or_else(invalid)?;

    let extension = header
        .strip_prefix("image/")
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(invalid)?;

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(invalid());
    }

    Ok(DecodedImage { extension, bytes })
}

/// Filesystem-backed media store
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    /// Create a store rooted at the configured directory
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.clone(),
        }
    }

    /// Directory served under [`Self::url_prefix`]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL prefix, always with leading and trailing slashes
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Public URL of a stored file
    #[must_use]
    pub fn url_for(&self, relative_path: &str) -> String {
        format!("{}{relative_path}", self.url_prefix)
    }

    /// Decode a data URI from request `field` and store it under `kind`
    ///
    /// Returns the stored path relative to the media root.
    ///
    /// # Errors
    ///
    /// Returns a field error for malformed data, or a storage error if the
    /// file cannot be written
    pub async fn save_data_uri(&self, field: &str, kind: &str, data_uri: &str) -> AppResult<String> {
        let image = decode_data_uri(field, data_uri)?;
        self.save(kind, &image).await
    }

    /// Store an already decoded image under `kind`, returning its relative path
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory or file cannot be written
    pub async fn save(&self, kind: &str, image: &DecodedImage) -> AppResult<String> {
        let relative = format!("{kind}/{}.{}", Uuid::new_v4(), image.extension);
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&target, &image.bytes)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write {}: {e}", target.display())))?;

        debug!(path = %relative, bytes = image.bytes.len(), "Stored media file");
        Ok(relative)
    }

    /// Delete a stored file; a file that is already gone is not an error
    pub async fn remove(&self, relative_path: &str) {
        match fs::remove_file(self.root.join(relative_path)).await {
            Ok(()) => debug!(path = %relative_path, "Removed media file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %relative_path, error = %e, "Failed to remove media file"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    fn storage(root: &Path) -> MediaStorage {
        MediaStorage::new(&MediaConfig {
            root: root.to_path_buf(),
            url_prefix: "/media/".to_owned(),
        })
    }

    #[test]
    fn test_decode_accepts_allowed_types() {
        let image = decode_data_uri("image", &format!("data:image/PNG;base64,{PIXEL}")).unwrap();
        assert_eq!(image.extension, "png");
        assert!(image.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        for raw in [
            "not a data uri",
            "data:image/png;base64,",
            "data:image/png;base64,@@@",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/tiff;base64,aGVsbG8=",
        ] {
            let err = decode_data_uri("avatar", raw).unwrap_err();
            assert!(err.field_errors.contains_key("avatar"), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let media = storage(dir.path());

        let path = media
            .save_data_uri("image", "recipes/images", &format!("data:image/png;base64,{PIXEL}"))
            .await
            .unwrap();
        assert!(path.starts_with("recipes/images/"));
        assert!(path.ends_with(".png"));
        assert!(dir.path().join(&path).exists());
        assert_eq!(media.url_for(&path), format!("/media/{path}"));

        media.remove(&path).await;
        assert!(!dir.path().join(&path).exists());
        // second removal is silent
        media.remove(&path).await;
    }
}
