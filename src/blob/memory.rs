use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{validate_key, BlobError, BlobResult, BlobStore};

/// In-memory blob store for tests and for running without a disk or bucket.
///
/// Clones share the same objects. `fail_puts` / `fail_deletes` make the matching
/// operation return an I/O error so failure paths can be exercised.
#[derive(Clone)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<BTreeMap<String, Bytes>>>,
    url_prefix: String,
    fail_puts: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new(url_prefix: &str) -> Self {
        Self {
            objects: Arc::default(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            fail_puts: Arc::default(),
            fail_deletes: Arc::default(),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("/uploads")
    }
}

fn injected_failure(op: &str) -> BlobError {
    BlobError::Io(std::io::Error::other(format!("injected {} failure", op)))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: Option<&str>) -> BlobResult<String> {
        validate_key(key)?;
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(injected_failure("put"));
        }
        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(BlobError::AlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), data);
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        validate_key(key)?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected_failure("delete"));
        }
        self.objects.write().await.remove(key);
        Ok(())
    }
}
