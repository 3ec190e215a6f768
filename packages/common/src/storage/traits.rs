use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Per-call key limit of the S3 multi-object delete API.
pub const MAX_BATCH_DELETE: usize = 1000;

/// A key the remote store refused or failed to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDeleteError {
    pub key: String,
    pub code: String,
    pub message: String,
}

/// Per-key result of a batch delete.
///
/// A non-empty `errors` list is a partial failure, not an overall one: every key
/// in `deleted` is confirmed gone and may be released by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteOutcome {
    pub deleted: Vec<String>,
    pub errors: Vec<KeyDeleteError>,
}

impl BatchDeleteOutcome {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty() && !self.deleted.is_empty()
    }
}

/// Key-addressed remote object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`, replacing any existing object.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Delete up to [`batch_delete_limit`](Self::batch_delete_limit) keys in one call.
    ///
    /// Deleting a key that does not exist counts as confirmed.
    async fn batch_delete(&self, keys: &[String]) -> Result<BatchDeleteOutcome, StorageError>;

    /// Time-limited download URL for access-controlled objects.
    async fn presigned_get(&self, key: &str, ttl_minutes: u32) -> Result<String, StorageError>;

    /// Public URL of an object.
    fn public_url(&self, key: &str) -> String;

    /// Maximum number of keys accepted by a single `batch_delete` call.
    fn batch_delete_limit(&self) -> usize {
        MAX_BATCH_DELETE
    }
}

pub(crate) fn check_batch_len(keys: &[String], limit: usize) -> Result<(), StorageError> {
    if keys.len() > limit {
        return Err(StorageError::BatchTooLarge {
            actual: keys.len(),
            limit,
        });
    }
    Ok(())
}
