use serde::{Deserialize, Serialize};

use crate::files::{FileRole, OwnerKind};

/// Request body for assigning a singleton file (thumbnail, profile image).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetFileRequest {
    #[schema(example = 42)]
    pub file_id: i64,
}

/// Request body carrying an owner's markdown content.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ContentRequest {
    /// Markdown body. File references use `::file[id=<id> ...]::`.
    /// Absent or blank clears every content reference.
    #[schema(example = "Intro\n\n::file[id=42 alt=\"diagram\"]::")]
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MappingResponse {
    pub owner_type: OwnerKind,
    #[schema(example = 7)]
    pub owner_id: i64,
    pub role: FileRole,
    /// Files now mapped under `role`, in display order.
    pub file_ids: Vec<i64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentSyncResponse {
    /// Ids newly mapped by this update.
    pub added: Vec<i64>,
    /// Ids no longer referenced by the body.
    pub removed: Vec<i64>,
    pub file_ids: Vec<i64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClearMappingsResponse {
    /// Mapping rows deleted.
    #[schema(example = 3)]
    pub removed: u64,
}
