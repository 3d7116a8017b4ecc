//! Product images: external URLs or uploaded files.
//!
//! Every write path funnels through [`assemble`] or [`promote_legacy_url`],
//! which leave a non-empty collection with exactly one primary image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agristore_core::ImageId;

/// Descriptor of a file persisted by the upload store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: ImageId,
    pub original_filename: String,
    /// Storage key relative to the upload root, `/`-separated.
    pub path: String,
    pub size: u64,
    pub mime_type: String,
}

/// A stored upload together with the public URL it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file: StoredFile,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    Url,
    Upload {
        filename: String,
        file_path: String,
        file_size: u64,
        mime_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub url: String,
    pub source: ImageSource,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl ProductImage {
    pub fn from_url(url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ImageId::new(),
            url: url.into(),
            source: ImageSource::Url,
            is_primary: false,
            created_at: now,
        }
    }

    pub fn from_upload(upload: UploadedImage, now: DateTime<Utc>) -> Self {
        let UploadedImage { file, url } = upload;
        Self {
            id: file.id,
            url,
            source: ImageSource::Upload {
                filename: file.original_filename,
                file_path: file.path,
                file_size: file.size,
                mime_type: file.mime_type,
            },
            is_primary: false,
            created_at: now,
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self.source, ImageSource::Url)
    }

    /// Storage key of the backing file, for uploaded images.
    pub fn stored_path(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Upload { file_path, .. } => Some(file_path),
            ImageSource::Url => None,
        }
    }
}

/// Trim URL input and drop blanks.
pub fn clean_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    urls.iter()
        .map(|u| u.as_ref().trim())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build an image collection: uploads first, then URLs.
///
/// The legacy single URL is only used when no URL list was given.
pub fn assemble(
    uploads: Vec<UploadedImage>,
    urls: &[String],
    legacy_url: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<ProductImage> {
    let mut images: Vec<ProductImage> = uploads
        .into_iter()
        .map(|u| ProductImage::from_upload(u, now))
        .collect();

    let urls = clean_urls(urls);
    if urls.is_empty() {
        if let Some(legacy) = legacy_url.map(str::trim).filter(|u| !u.is_empty()) {
            images.push(ProductImage::from_url(legacy, now));
        }
    } else {
        images.extend(urls.into_iter().map(|u| ProductImage::from_url(u, now)));
    }

    ensure_single_primary(&mut images);
    images
}

/// Keep the first flagged image as primary, or flag the first image if none is.
pub fn ensure_single_primary(images: &mut [ProductImage]) {
    let keep = images.iter().position(|i| i.is_primary).unwrap_or(0);
    for (idx, image) in images.iter_mut().enumerate() {
        image.is_primary = idx == keep;
    }
}

/// Apply a legacy single-URL update.
///
/// Rewrites the primary image in place when it is URL-based, otherwise
/// prepends a new primary URL image.
pub fn promote_legacy_url(images: &mut Vec<ProductImage>, url: &str, now: DateTime<Utc>) {
    match images.iter_mut().find(|i| i.is_primary && i.is_url()) {
        Some(primary) => primary.url = url.to_string(),
        None => {
            let mut image = ProductImage::from_url(url, now);
            image.is_primary = true;
            images.insert(0, image);
        }
    }
    ensure_single_primary(images);
}

pub fn primary_url(images: &[ProductImage]) -> Option<String> {
    images.iter().find(|i| i.is_primary).map(|i| i.url.clone())
}
