use std::path::PathBuf;

use serde::Deserialize;

use crate::storage::MAX_BATCH_DELETE;

/// Which blob store backend to build.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    #[default]
    Filesystem,
    Memory,
}

/// Remote object storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Bucket name. Required for the S3 backend.
    #[serde(default)]
    pub bucket: String,
    /// Default: "us-east-1".
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Use path-style addressing. Required by most self-hosted S3 services.
    #[serde(default)]
    pub path_style: bool,
    /// Base URL used to build public object URLs (usually the CDN domain).
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Root directory for the filesystem backend. Default: "./data/objects".
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Keys per batch-delete call. Default: 1000 (the S3 limit).
    #[serde(default = "default_batch_delete_limit")]
    pub batch_delete_limit: usize,
    /// Concurrent delete requests within one batch. Default: 16.
    #[serde(default = "default_delete_concurrency")]
    pub delete_concurrency: usize,
    /// Presigned URL lifetime when the caller does not ask for one. Default: 10.
    #[serde(default = "default_presign_minutes")]
    pub presign_default_minutes: u32,
}

fn default_region() -> String {
    "us-east-1".into()
}
fn default_root() -> PathBuf {
    PathBuf::from("./data/objects")
}
fn default_batch_delete_limit() -> usize {
    MAX_BATCH_DELETE
}
fn default_delete_concurrency() -> usize {
    16
}
fn default_presign_minutes() -> u32 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
            public_base_url: None,
            root: default_root(),
            batch_delete_limit: default_batch_delete_limit(),
            delete_concurrency: default_delete_concurrency(),
            presign_default_minutes: default_presign_minutes(),
        }
    }
}

/// Which CDN invalidator to build.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CdnBackend {
    /// No CDN in front of the store; invalidation is skipped.
    #[default]
    None,
    /// HTTP purge endpoint accepting `{"paths": [...]}`.
    Http,
}

/// CDN cache invalidation configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct CdnConfig {
    #[serde(default)]
    pub backend: CdnBackend,
    /// Purge endpoint URL. Required for the HTTP backend.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer token sent with purge requests.
    #[serde(default)]
    pub token: Option<String>,
    /// Paths per invalidation call. Default: 1000.
    #[serde(default = "default_max_paths")]
    pub max_paths_per_call: usize,
    /// Request timeout in seconds. Default: 30.
    #[serde(default = "default_cdn_timeout")]
    pub timeout_secs: u64,
}

fn default_max_paths() -> usize {
    1000
}
fn default_cdn_timeout() -> u64 {
    30
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            backend: CdnBackend::default(),
            endpoint: None,
            token: None,
            max_paths_per_call: default_max_paths(),
            timeout_secs: default_cdn_timeout(),
        }
    }
}
