//! Blob storage for uploaded car images.
//!
//! A [`BlobStore`] writes bytes under a key and hands back the public location of the
//! object. Locations are what cars record in their `images` list; the key is always
//! recoverable as the last path segment of the location.

pub mod local;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

lazy_static! {
    // Anything outside this set is replaced when building a key from a client filename.
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

pub type BlobResult<T> = Result<T, BlobError>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `key` and returns its public location.
    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> BlobResult<String>;

    /// Removes the object stored under `key`. Removing a missing object is not an error.
    async fn delete(&self, key: &str) -> BlobResult<()>;
}

/// Extracts the storage key from a location: its last path segment.
pub fn key_from_location(location: &str) -> &str {
    location.rsplit('/').next().unwrap_or(location)
}

/// Builds the key `<epoch-ms>-<unique>-<filename>` for an uploaded file.
///
/// `unique` keeps concurrent uploads of the same filename apart. Only the final segment
/// of the client filename is used and characters outside `[A-Za-z0-9._-]` are replaced
/// with `_`.
pub fn upload_key(epoch_millis: i64, unique: Uuid, original_filename: &str) -> String {
    let base = original_filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let sanitized = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let name = match sanitized.trim_matches('.') {
        "" => "image",
        trimmed => trimmed,
    };
    format!("{}-{}-{}", epoch_millis, unique.simple(), name)
}

/// Rejects keys that could address anything other than a single flat object.
pub(crate) fn validate_key(key: &str) -> BlobResult<()> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}
