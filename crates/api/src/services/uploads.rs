//! Product image storage on the local filesystem.
//!
//! Uploaded files are renamed to `{uuid}.{ext}` and served back under
//! `/uploads/products/`. Only the stored file name is persisted on the
//! product; clients resolve it against the API base URL.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

/// Public path prefix the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads/products";

/// File extensions accepted for product images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file is empty.
    #[error("uploaded file is empty")]
    Empty,

    /// The file extension is not an accepted image type.
    #[error("unsupported file type; allowed: jpg, jpeg, png, webp, gif")]
    UnsupportedType,

    /// Writing to disk failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, used only for its extension.
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Writes product images into a directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at `dir`. The directory is created lazily.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store one file and return its generated name.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Empty` or `UploadError::UnsupportedType` for bad
    /// input, `UploadError::Io` if the write fails.
    pub async fn save(&self, file: &UploadedFile) -> Result<String, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let ext = file
            .file_name
            .as_deref()
            .and_then(allowed_extension)
            .ok_or(UploadError::UnsupportedType)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let stored_name = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&stored_name), &file.bytes).await?;

        tracing::info!(file = %stored_name, bytes = file.bytes.len(), "Stored product image");
        Ok(stored_name)
    }

    /// Store several files, in order.
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be stored. Files already written
    /// by this call are removed again.
    pub async fn save_all(&self, files: &[UploadedFile]) -> Result<Vec<String>, UploadError> {
        let mut names = Vec::with_capacity(files.len());
        for file in files {
            match self.save(file).await {
                Ok(name) => names.push(name),
                Err(e) => {
                    self.remove_all(&names).await;
                    return Err(e);
                }
            }
        }
        Ok(names)
    }

    /// Delete previously stored files. Failures are logged and skipped.
    pub async fn remove_all(&self, names: &[String]) {
        for name in names {
            // Only bare generated names live in this directory
            if Path::new(name).file_name() != Some(std::ffi::OsStr::new(name)) {
                tracing::warn!(file = %name, "Refusing to remove upload outside store");
                continue;
            }
            match tokio::fs::remove_file(self.dir.join(name)).await {
                Ok(()) => tracing::info!(file = %name, "Removed product image"),
                Err(e) => tracing::warn!(file = %name, error = %e, "Failed to remove product image"),
            }
        }
    }
}

/// Lowercased extension of `file_name` if it is an accepted image type.
fn allowed_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
