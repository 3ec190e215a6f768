use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::files::{FileRole, MappingService, OwnerKind, OwnerRef};
use crate::models::mapping::{MappingResponse, SetFileRequest};
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/{id}/profile-image",
    tag = "User Files",
    operation_id = "setProfileImage",
    summary = "Set a user's profile image",
    description = "Replaces the user's profile image mapping. The file must exist.",
    params(("id" = i64, Path, description = "User ID")),
    request_body = SetFileRequest,
    responses(
        (status = 200, description = "Profile image set", body = MappingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn set_profile_image(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    AppJson(payload): AppJson<SetFileRequest>,
) -> Result<Json<MappingResponse>, AppError> {
    let owner = OwnerRef::user(user_id);
    let mappings = MappingService::new(&state.db);
    mappings
        .set_singleton_mapping(owner, payload.file_id, FileRole::ProfileImage)
        .await?;

    let file_ids = mappings
        .singleton_file_id(owner, FileRole::ProfileImage)
        .await?
        .into_iter()
        .collect();

    Ok(Json(MappingResponse {
        owner_type: OwnerKind::User,
        owner_id: user_id,
        role: FileRole::ProfileImage,
        file_ids,
    }))
}
