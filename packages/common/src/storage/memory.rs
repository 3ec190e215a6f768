use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::{BatchDeleteOutcome, BlobStore, KeyDeleteError, MAX_BATCH_DELETE, check_batch_len};

#[derive(Default)]
struct Inner {
    objects: HashMap<String, (Vec<u8>, String)>,
    failing_keys: HashSet<String>,
    fail_all: bool,
    batch_calls: Vec<usize>,
}

/// In-process object store.
///
/// Supports injected failures so callers can exercise partial batch deletes.
pub struct MemoryBlobStore {
    inner: Mutex<Inner>,
    public_base_url: String,
    batch_limit: usize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://objects")
    }
}

impl MemoryBlobStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            public_base_url: public_base_url.into(),
            batch_limit: MAX_BATCH_DELETE,
        }
    }

    /// Make every future delete of `key` fail with `AccessDenied`.
    pub fn fail_key(&self, key: impl Into<String>) {
        self.lock().failing_keys.insert(key.into());
    }

    /// Make every future `batch_delete` call fail as a whole.
    pub fn fail_all_batches(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sizes of every `batch_delete` call received so far.
    pub fn batch_calls(&self) -> Vec<usize> {
        self.lock().batch_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        self.lock()
            .objects
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn batch_delete(&self, keys: &[String]) -> Result<BatchDeleteOutcome, StorageError> {
        check_batch_len(keys, self.batch_limit)?;

        let mut inner = self.lock();
        inner.batch_calls.push(keys.len());
        if inner.fail_all {
            return Err(StorageError::remote("ServiceUnavailable", "injected failure"));
        }

        let mut outcome = BatchDeleteOutcome::default();
        for key in keys {
            if inner.failing_keys.contains(key) {
                outcome.errors.push(KeyDeleteError {
                    key: key.clone(),
                    code: "AccessDenied".into(),
                    message: "Access Denied".into(),
                });
            } else {
                inner.objects.remove(key);
                outcome.deleted.push(key.clone());
            }
        }
        Ok(outcome)
    }

    async fn presigned_get(&self, key: &str, ttl_minutes: u32) -> Result<String, StorageError> {
        if !self.contains(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("{}?expires_in={}", self.public_url(key), ttl_minutes * 60))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    fn batch_delete_limit(&self) -> usize {
        self.batch_limit
    }
}
