use common::{CdnConfig, StorageConfig};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}

/// Per-category upload size limits in bytes.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_image_max")]
    pub image_max_bytes: u64,
    #[serde(default = "default_video_max")]
    pub video_max_bytes: u64,
    #[serde(default = "default_document_max")]
    pub document_max_bytes: u64,
    #[serde(default = "default_audio_max")]
    pub audio_max_bytes: u64,
    #[serde(default = "default_archive_max")]
    pub archive_max_bytes: u64,
}

const MIB: u64 = 1024 * 1024;

fn default_image_max() -> u64 {
    10 * MIB
}
fn default_video_max() -> u64 {
    100 * MIB
}
fn default_document_max() -> u64 {
    20 * MIB
}
fn default_audio_max() -> u64 {
    20 * MIB
}
fn default_archive_max() -> u64 {
    100 * MIB
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            image_max_bytes: default_image_max(),
            video_max_bytes: default_video_max(),
            document_max_bytes: default_document_max(),
            audio_max_bytes: default_audio_max(),
            archive_max_bytes: default_archive_max(),
        }
    }
}

impl UploadConfig {
    /// Largest limit across categories; used as the request body limit.
    pub fn max_body_bytes(&self) -> u64 {
        [
            self.image_max_bytes,
            self.video_max_bytes,
            self.document_max_bytes,
            self.audio_max_bytes,
            self.archive_max_bytes,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Orphan file garbage collection.
#[derive(Debug, Deserialize, Clone)]
pub struct GcConfig {
    /// Whether the periodic job runs. Default: true.
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,
    /// Seconds between runs. Default: 86400 (daily).
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,
    /// Minimum age before an unreferenced file may be deleted. Default: 24.
    #[serde(default = "default_grace_hours")]
    pub grace_hours: i64,
    /// Ids per `NOT IN` list when querying unused files. Default: 1000.
    #[serde(default = "default_query_batch")]
    pub query_batch_size: usize,
}

fn default_gc_enabled() -> bool {
    true
}
fn default_gc_interval() -> u64 {
    86_400
}
fn default_grace_hours() -> i64 {
    24
}
fn default_query_batch() -> usize {
    1000
}

/// Longest accepted grace period: one year.
pub const MAX_GRACE_HOURS: i64 = 24 * 365;

impl GcConfig {
    /// `grace_hours` must lie in `1..=MAX_GRACE_HOURS`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_GRACE_HOURS).contains(&self.grace_hours) {
            return Err(ConfigError::Message(format!(
                "gc.grace_hours must be between 1 and {MAX_GRACE_HOURS}, got {}",
                self.grace_hours
            )));
        }
        Ok(())
    }
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
            grace_hours: default_grace_hours(),
            query_batch_size: default_query_batch(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cdn: CdnConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub gc: GcConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FOLIO__STORAGE__BUCKET)
            .add_source(Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.gc.validate()?;
        Ok(config)
    }
}
