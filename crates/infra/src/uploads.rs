//! Local-disk storage for uploaded product images.
//!
//! Files live under `<root>/products/` and are served over HTTP at
//! `/uploads/<key>`, where the key is the path relative to the root.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use agristore_catalog::{StoredFile, UploadedImage};
use agristore_core::{DomainError, DomainResult, ImageId};

/// Per-file size cap (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// URL path prefix the upload root is served under.
pub const PUBLIC_PREFIX: &str = "uploads";

const PRODUCT_DIR: &str = "products";

/// A fully buffered file received from a client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("refusing to touch '{0}': outside the upload root")]
    OutsideRoot(String),

    #[error("upload io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Check size, declared MIME type and extension.
pub fn validate_upload(file: &IncomingFile) -> DomainResult<()> {
    let size = file.bytes.len() as u64;
    if size > MAX_UPLOAD_BYTES {
        return Err(DomainError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let mime = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(DomainError::unsupported_type(format!(
            "content type '{mime}' is not an accepted image type"
        )));
    }

    match extension_of(&file.filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(DomainError::unsupported_type(format!(
            "file '{}' does not have an image extension",
            file.filename
        ))),
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub root: PathBuf,
    /// Scheme + host the server is reachable at, e.g. `http://localhost:8082`.
    pub public_base_url: String,
}

#[derive(Debug)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            root: config.root,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base URL + `/uploads/` + key, with `\` normalized to `/`.
    pub fn public_url(&self, key: &str) -> String {
        let key = key.replace('\\', "/");
        format!(
            "{}/{}/{}",
            self.public_base_url,
            PUBLIC_PREFIX,
            key.trim_start_matches('/')
        )
    }

    /// Validate and persist one file.
    ///
    /// Bytes go to a hidden temp file first and are renamed into place, so a
    /// failed write never leaves a file at the published key.
    pub async fn store(&self, file: &IncomingFile) -> Result<UploadedImage, UploadError> {
        validate_upload(file)?;

        let id = ImageId::new();
        let ext = extension_of(&file.filename).unwrap_or_default();
        let name = format!("{}_{}.{}", Utc::now().timestamp(), id, ext);
        let dir = self.root.join(PRODUCT_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let tmp = dir.join(format!(".{name}.part"));
        let dest = dir.join(&name);
        let written = match tokio::fs::write(&tmp, &file.bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &dest).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        let key = format!("{PRODUCT_DIR}/{name}");
        Ok(UploadedImage {
            url: self.public_url(&key),
            file: StoredFile {
                id,
                original_filename: file.filename.clone(),
                path: key,
                size: file.bytes.len() as u64,
                mime_type: file.content_type.clone(),
            },
        })
    }

    /// Validate every file, then store them all. On failure nothing stays stored.
    pub async fn store_all(&self, files: &[IncomingFile]) -> Result<Vec<UploadedImage>, UploadError> {
        for file in files {
            validate_upload(file)?;
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match self.store(file).await {
                Ok(image) => stored.push(image),
                Err(e) => {
                    self.discard(stored.into_iter().map(|i| i.file.path)).await;
                    return Err(e);
                }
            }
        }
        Ok(stored)
    }

    /// Remove a stored file. Returns `false` when it was already gone.
    pub async fn delete(&self, key: &str) -> Result<bool, UploadError> {
        let path = self.resolve(key).await?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort cleanup; failures are logged and swallowed.
    pub async fn discard(&self, keys: impl IntoIterator<Item = String>) {
        for key in keys {
            if let Err(e) = self.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "failed to remove uploaded file");
            }
        }
    }

    /// Map a storage key to a path, refusing anything that escapes the root.
    async fn resolve(&self, key: &str) -> Result<PathBuf, UploadError> {
        let normalized = key.replace('\\', "/");
        let relative = Path::new(&normalized);
        let lexically_inside = !normalized.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !lexically_inside {
            return Err(UploadError::OutsideRoot(key.to_string()));
        }

        let path = self.root.join(relative);
        // Symlinks can still point elsewhere; compare canonical forms when the
        // file exists.
        if let (Ok(root), Ok(target)) = (
            tokio::fs::canonicalize(&self.root).await,
            tokio::fs::canonicalize(&path).await,
        ) {
            if !target.starts_with(&root) {
                return Err(UploadError::OutsideRoot(key.to_string()));
            }
        }
        Ok(path)
    }
}
