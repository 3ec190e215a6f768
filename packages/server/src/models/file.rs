use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::file_record;

/// Longest presigned URL lifetime a caller may request (7 days).
pub const MAX_PRESIGN_MINUTES: u32 = 7 * 24 * 60;

/// Response DTO for a stored file.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FileResponse {
    #[schema(example = 42)]
    pub id: i64,
    /// Filename as uploaded.
    #[schema(example = "diagram.png")]
    pub original_name: String,
    /// Public (CDN) URL of the object.
    #[schema(example = "https://cdn.example.com/public/images/2026/01/05/0b6f9c1e-8d1e-4c55-9a53-2f1f0c7b8f11.png")]
    pub url: String,
    #[schema(example = "image/png")]
    pub content_type: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl FileResponse {
    pub fn new(model: file_record::Model, url: String) -> Self {
        Self {
            id: model.id,
            original_name: model.original_name,
            url,
            content_type: model.content_type,
            size: model.size,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PresignedQuery {
    /// URL lifetime in minutes (1-10080). Defaults to `storage.presign_default_minutes`.
    #[param(example = 10)]
    pub ttl_minutes: Option<u32>,
}

impl PresignedQuery {
    pub fn ttl(&self, default_minutes: u32) -> u32 {
        self.ttl_minutes
            .unwrap_or(default_minutes)
            .clamp(1, MAX_PRESIGN_MINUTES)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PresignedUrlResponse {
    pub url: String,
    #[schema(example = 10)]
    pub expires_in_minutes: u32,
}
