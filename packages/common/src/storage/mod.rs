mod error;
mod key;
mod traits;

pub mod filesystem;
pub mod memory;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::StorageError;
pub use key::{StorageKey, cdn_path, extension_of};
pub use traits::{BatchDeleteOutcome, BlobStore, KeyDeleteError, MAX_BATCH_DELETE};

use crate::config::{StorageBackend, StorageConfig};

/// Build the configured blob store backend.
pub async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let base_url = config
                .public_base_url
                .clone()
                .unwrap_or_else(|| "http://127.0.0.1:3000/files".into());
            let store = filesystem::FilesystemBlobStore::new(
                config.root.clone(),
                base_url,
                config.batch_delete_limit,
            )
            .await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            let base_url = config
                .public_base_url
                .clone()
                .unwrap_or_else(|| "memory://objects".into());
            Ok(Arc::new(memory::MemoryBlobStore::new(base_url)))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => Ok(Arc::new(s3::S3BlobStore::new(config)?)),
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Config(
            "S3 backend requires the `object-storage` feature".into(),
        )),
    }
}
