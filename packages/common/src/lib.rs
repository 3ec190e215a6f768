pub mod cdn;
pub mod config;
pub mod storage;

pub use config::{CdnBackend, CdnConfig, StorageBackend, StorageConfig};
