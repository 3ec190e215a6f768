use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::config::UploadConfig;
use crate::error::{AppError, ErrorBody};
use crate::files::upload::validate_upload;
use crate::files::{FileRecordStore, NewFileRecord};
use crate::models::file::{FileResponse, PresignedQuery, PresignedUrlResponse};
use crate::state::AppState;

/// Multipart overhead allowed on top of the largest file.
const MULTIPART_SLACK: u64 = 64 * 1024;

pub fn upload_body_limit(config: &UploadConfig) -> DefaultBodyLimit {
    let limit = config.max_body_bytes().saturating_add(MULTIPART_SLACK);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores a single file in the blob store and records its metadata. The `file` \
        multipart field is required. The extension decides the category (image, video, document, \
        audio, archive) and its size limit. The file is unreferenced until an owner maps it and \
        becomes eligible for garbage collection after the grace period.",
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "File exceeds its category limit (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("file") {
            if upload.is_some() {
                return Err(AppError::Validation(
                    "Only one 'file' field is allowed per upload".into(),
                ));
            }
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
            upload = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;

    let validated = validate_upload(&file_name, data.len() as u64, &state.config.upload)?;
    let key = validated.storage_key(Utc::now());

    state
        .blob_store
        .put(key.as_str(), &data, &validated.content_type)
        .await?;

    let saved = FileRecordStore::new(&state.db)
        .create(NewFileRecord {
            original_name: validated.filename,
            storage_key: key.as_str().to_string(),
            content_type: validated.content_type,
            size: data.len() as i64,
        })
        .await;

    let saved = match saved {
        Ok(saved) => saved,
        Err(e) => {
            // Without a record the object is invisible to garbage collection.
            if let Err(cleanup) = state.blob_store.batch_delete(&[key.as_str().to_string()]).await
            {
                warn!(key = %key, error = %cleanup, "Failed to remove object after insert failure");
            }
            return Err(e.into());
        }
    };

    info!(file_id = saved.id, size = saved.size, "File uploaded");
    let url = state.blob_store.public_url(&saved.storage_key);
    Ok((StatusCode::CREATED, Json(FileResponse::new(saved, url))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = i64, Path, description = "File ID")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<FileResponse>, AppError> {
    let record = FileRecordStore::new(&state.db).find(id).await?;
    let url = state.blob_store.public_url(&record.storage_key);
    Ok(Json(FileResponse::new(record, url)))
}

#[utoipa::path(
    get,
    path = "/{id}/presigned",
    tag = "Files",
    operation_id = "getPresignedUrl",
    summary = "Get a time-limited download URL",
    description = "Returns a presigned GET URL for the file. `ttl_minutes` is clamped to 1-10080.",
    params(("id" = i64, Path, description = "File ID"), PresignedQuery),
    responses(
        (status = 200, description = "Presigned URL", body = PresignedUrlResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Blob store failure (STORAGE_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn get_presigned_url(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PresignedQuery>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let record = FileRecordStore::new(&state.db).find(id).await?;
    let ttl = query.ttl(state.config.storage.presign_default_minutes);
    let url = state
        .blob_store
        .presigned_get(&record.storage_key, ttl)
        .await?;

    Ok(Json(PresignedUrlResponse {
        url,
        expires_in_minutes: ttl,
    }))
}
