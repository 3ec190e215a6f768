use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::files::GcReport;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/files/gc",
    tag = "Admin",
    operation_id = "runFileGc",
    summary = "Run orphan file garbage collection now",
    description = "Runs one collection pass synchronously: collects referenced ids from every \
        owner domain, deletes unreferenced files older than the grace period from the blob store, \
        invalidates their CDN paths and removes their records. A pass is skipped when no file is \
        referenced anywhere.",
    responses(
        (status = 200, description = "Run finished", body = GcReport),
        (status = 500, description = "Run failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn run_file_gc(State(state): State<AppState>) -> Result<Json<GcReport>, AppError> {
    let report = state.gc.run_once().await?;
    Ok(Json(report))
}
