use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::StorageKey;
use super::traits::{BatchDeleteOutcome, BlobStore, KeyDeleteError, check_batch_len};

/// Filesystem-backed object store for local development.
///
/// Objects live at `{base_path}/{key}`. There is no signing, so presigned URLs
/// are the public URL.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_base_url: String,
    batch_limit: usize,
}

impl FilesystemBlobStore {
    /// Create a new filesystem store.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        batch_limit: usize,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
            batch_limit,
        })
    }

    fn object_path(&self, key: &StorageKey) -> PathBuf {
        self.base_path.join(key.as_str())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn delete_one(&self, key: &str) -> Result<(), StorageError> {
        let key = StorageKey::parse(key)?;
        match fs::remove_file(self.object_path(&key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let key = StorageKey::parse(key)?;
        let object_path = self.object_path(&key);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn batch_delete(&self, keys: &[String]) -> Result<BatchDeleteOutcome, StorageError> {
        check_batch_len(keys, self.batch_limit)?;

        let mut outcome = BatchDeleteOutcome::default();
        for key in keys {
            match self.delete_one(key).await {
                Ok(()) => outcome.deleted.push(key.clone()),
                Err(e) => outcome.errors.push(KeyDeleteError {
                    key: key.clone(),
                    code: match &e {
                        StorageError::InvalidKey(_) => "InvalidKey".into(),
                        _ => "IoError".into(),
                    },
                    message: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    async fn presigned_get(&self, key: &str, _ttl_minutes: u32) -> Result<String, StorageError> {
        let key = StorageKey::parse(key)?;
        if !fs::try_exists(self.object_path(&key)).await? {
            return Err(StorageError::NotFound(key.into_string()));
        }
        Ok(self.public_url(key.as_str()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }

    fn batch_delete_limit(&self) -> usize {
        self.batch_limit
    }
}
