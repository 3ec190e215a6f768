use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CdnError, CdnInvalidator};
use crate::config::CdnConfig;

#[derive(Serialize)]
struct PurgeRequest<'a> {
    paths: &'a [String],
    caller_reference: String,
}

#[derive(Deserialize)]
struct PurgeResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Invalidator that POSTs `{"paths": [...], "caller_reference": "..."}` to a purge
/// endpoint with a bearer token.
pub struct HttpPurgeInvalidator {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    max_paths: usize,
}

impl HttpPurgeInvalidator {
    pub fn new(config: &CdnConfig) -> Result<Self, CdnError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| CdnError::Config("cdn.endpoint is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CdnError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token: config.token.clone(),
            max_paths: config.max_paths_per_call.max(1),
        })
    }
}

#[async_trait]
impl CdnInvalidator for HttpPurgeInvalidator {
    async fn invalidate(&self, paths: &[String]) -> Result<String, CdnError> {
        if paths.len() > self.max_paths {
            return Err(CdnError::TooManyPaths {
                actual: paths.len(),
                limit: self.max_paths,
            });
        }

        let caller_reference = uuid::Uuid::now_v7().to_string();
        let mut request = self.client.post(&self.endpoint).json(&PurgeRequest {
            paths,
            caller_reference: caller_reference.clone(),
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CdnError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CdnError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // Providers that do not return an id are tracked by our caller reference.
        let id = response
            .json::<PurgeResponse>()
            .await
            .ok()
            .and_then(|r| r.id)
            .unwrap_or(caller_reference);

        debug!(invalidation_id = %id, paths = paths.len(), "CDN invalidation accepted");
        Ok(id)
    }

    fn max_paths_per_call(&self) -> usize {
        self.max_paths
    }
}
