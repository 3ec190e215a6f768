mod error;
#[cfg(feature = "cdn-http")]
pub mod http;
pub mod recording;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::CdnError;

use crate::config::{CdnBackend, CdnConfig};

/// CDN edge-cache invalidation.
///
/// Invalidation is best-effort: cached copies expire on their own TTL, so
/// callers log failures and move on.
#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    /// Invalidate up to [`max_paths_per_call`](Self::max_paths_per_call) paths.
    /// Returns the provider's invalidation id.
    async fn invalidate(&self, paths: &[String]) -> Result<String, CdnError>;

    fn max_paths_per_call(&self) -> usize;

    /// `false` when no CDN is configured and invalidation should be skipped.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Invalidator used when no CDN sits in front of the store.
pub struct NoopInvalidator;

#[async_trait]
impl CdnInvalidator for NoopInvalidator {
    async fn invalidate(&self, _paths: &[String]) -> Result<String, CdnError> {
        Ok(String::new())
    }

    fn max_paths_per_call(&self) -> usize {
        usize::MAX
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Build the configured CDN invalidator.
pub fn build_invalidator(config: &CdnConfig) -> Result<Arc<dyn CdnInvalidator>, CdnError> {
    match config.backend {
        CdnBackend::None => Ok(Arc::new(NoopInvalidator)),
        #[cfg(feature = "cdn-http")]
        CdnBackend::Http => Ok(Arc::new(http::HttpPurgeInvalidator::new(config)?)),
        #[cfg(not(feature = "cdn-http"))]
        CdnBackend::Http => Err(CdnError::Config(
            "HTTP CDN backend requires the `cdn-http` feature".into(),
        )),
    }
}
