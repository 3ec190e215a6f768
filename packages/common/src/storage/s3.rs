use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ::s3::creds::Credentials;
use ::s3::error::S3Error;
use ::s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::traits::{BatchDeleteOutcome, BlobStore, KeyDeleteError, check_batch_len};
use crate::config::StorageConfig;

/// S3-compatible object store (AWS S3, MinIO, R2, ...).
///
/// Batch deletes fan out per-key requests with bounded concurrency and report
/// each key's result separately.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    public_base_url: Option<String>,
    batch_limit: usize,
    delete_concurrency: usize,
}

impl From<S3Error> for StorageError {
    fn from(err: S3Error) -> Self {
        StorageError::remote("S3Error", err.to_string())
    }
}

impl S3BlobStore {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::Config("storage.bucket is required".into()));
        }

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: config.public_base_url.clone(),
            batch_limit: config.batch_delete_limit,
            delete_concurrency: config.delete_concurrency.max(1),
        })
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(StorageError::remote(
                status.to_string(),
                format!("put {key} failed with status {status}"),
            ));
        }
        debug!(key, size = data.len(), "Stored object");
        Ok(())
    }

    async fn batch_delete(&self, keys: &[String]) -> Result<BatchDeleteOutcome, StorageError> {
        check_batch_len(keys, self.batch_limit)?;

        let results: Vec<(String, Result<u16, S3Error>)> = stream::iter(keys.iter().cloned())
            .map(|key| async move {
                let result = self
                    .bucket
                    .delete_object(&key)
                    .await
                    .map(|r| r.status_code());
                (key, result)
            })
            .buffer_unordered(self.delete_concurrency)
            .collect()
            .await;

        let mut outcome = BatchDeleteOutcome::default();
        for (key, result) in results {
            match result {
                // S3 answers 204 for both existing and missing keys.
                Ok(status) if is_success(status) || status == 404 => outcome.deleted.push(key),
                Ok(status) => outcome.errors.push(KeyDeleteError {
                    key,
                    code: status.to_string(),
                    message: format!("delete failed with status {status}"),
                }),
                Err(e) => outcome.errors.push(KeyDeleteError {
                    key,
                    code: "RequestFailed".into(),
                    message: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    async fn presigned_get(&self, key: &str, ttl_minutes: u32) -> Result<String, StorageError> {
        let expiry_secs = ttl_minutes.saturating_mul(60);
        Ok(self.bucket.presign_get(key, expiry_secs, None).await?)
    }

    fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("{}/{}", self.bucket.url().trim_end_matches('/'), key),
        }
    }

    fn batch_delete_limit(&self) -> usize {
        self.batch_limit
    }
}
