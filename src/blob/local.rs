//! Local filesystem blob store.
//!
//! Objects are flat files in one directory. The directory is served statically under
//! `url_prefix`, so the location of key `k` is `<url_prefix>/<k>`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{validate_key, BlobError, BlobResult, BlobStore};

pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    /// Creates the store, making `root` if it does not exist yet.
    pub async fn new(root: impl AsRef<Path>, url_prefix: &str) -> BlobResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> BlobResult<String> {
        let path = self.key_path(key)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => BlobError::AlreadyExists(key.to_string()),
                _ => BlobError::Io(e),
            })?;
        file.write_all(&data).await?;
        file.flush().await?;
        log::debug!("stored {} ({} bytes)", path.display(), data.len());
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}
