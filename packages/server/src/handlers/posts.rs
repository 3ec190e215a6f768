use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::files::content::sync_content;
use crate::files::{FileRole, MappingService, OwnerKind, OwnerRef};
use crate::models::mapping::{
    ClearMappingsResponse, ContentRequest, ContentSyncResponse, MappingResponse, SetFileRequest,
};
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/{id}/thumbnail",
    tag = "Post Files",
    operation_id = "setPostThumbnail",
    summary = "Set a post's thumbnail",
    description = "Replaces the post's thumbnail mapping. The file must exist.",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = SetFileRequest,
    responses(
        (status = 200, description = "Thumbnail set", body = MappingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn set_thumbnail(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    AppJson(payload): AppJson<SetFileRequest>,
) -> Result<Json<MappingResponse>, AppError> {
    let owner = OwnerRef::post(post_id);
    let mappings = MappingService::new(&state.db);
    mappings
        .set_singleton_mapping(owner, payload.file_id, FileRole::Thumbnail)
        .await?;

    Ok(Json(MappingResponse {
        owner_type: OwnerKind::Post,
        owner_id: post_id,
        role: FileRole::Thumbnail,
        file_ids: mappings.file_ids(owner, FileRole::Thumbnail).await?,
    }))
}

#[utoipa::path(
    put,
    path = "/{id}/content",
    tag = "Post Files",
    operation_id = "syncPostContent",
    summary = "Sync a post's content references",
    description = "Extracts `::file[id=...]::` references from the body and updates the post's \
        content mappings to match. Newly referenced files must exist; nothing changes otherwise.",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = ContentRequest,
    responses(
        (status = 200, description = "Content mappings updated", body = ContentSyncResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Referenced file not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn sync_post_content(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    AppJson(payload): AppJson<ContentRequest>,
) -> Result<Json<ContentSyncResponse>, AppError> {
    let owner = OwnerRef::post(post_id);
    let body = payload.body.unwrap_or_default();
    let diff = sync_content(&state.db, owner, &body).await?;

    let file_ids = MappingService::new(&state.db)
        .file_ids(owner, FileRole::Content)
        .await?;

    Ok(Json(ContentSyncResponse {
        added: diff.to_add.into_iter().collect(),
        removed: diff.to_remove.into_iter().collect(),
        file_ids,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}/files",
    tag = "Post Files",
    operation_id = "clearPostFiles",
    summary = "Remove all of a post's file mappings",
    description = "Called when a post is deleted. The files themselves are left for garbage collection.",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Mappings removed", body = ClearMappingsResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn clear_post_files(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<ClearMappingsResponse>, AppError> {
    let removed = MappingService::new(&state.db)
        .clear_all_mappings(OwnerRef::post(post_id))
        .await?;
    Ok(Json(ClearMappingsResponse { removed }))
}
