//! Chunk upload and cleanup handlers

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::UploadState;
use crate::utils::upload::extract_chunk_form;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use chunkup_core::models::{ChunkUploadResponse, CleanupRequest, CleanupResponse};
use chunkup_core::AppError;

/// Receive one chunk of a file
///
/// Non-final chunks are acknowledged with the upload identifier. The final chunk
/// triggers reassembly and returns the stored artifact description.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/chunk",
    tag = "uploads",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "Parts: file (binary), chunkIndex, totalChunks, fileName, document_type, category, fileId"
    ),
    responses(
        (status = 200, description = "Chunk stored, or upload complete on the final chunk", body = ChunkUploadResponse),
        (status = 400, description = "Invalid chunk metadata or missing file part", body = ErrorResponse),
        (status = 409, description = "Duplicate chunk or upload already completing", body = ErrorResponse),
        (status = 413, description = "Chunk too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn upload_chunk(
    State(uploads): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChunkUploadResponse>, HttpAppError> {
    let form = extract_chunk_form(
        multipart?,
        uploads.limits.max_chunk_size_bytes,
        uploads.limits.max_total_chunks,
    )
    .await?;

    let response = uploads
        .reassembler
        .handle_chunk(form.meta, form.payload)
        .await?;

    Ok(Json(response))
}

/// Abandon an upload and delete its temporary chunks
///
/// Succeeds when there is nothing left to clean.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/cleanup",
    tag = "uploads",
    request_body = CleanupRequest,
    responses(
        (status = 200, description = "Cleanup successful", body = CleanupResponse),
        (status = 400, description = "Missing or invalid fileId", body = ErrorResponse),
        (status = 500, description = "Cleanup failed", body = ErrorResponse)
    )
)]
pub async fn cleanup_upload(
    State(uploads): State<UploadState>,
    ValidatedJson(request): ValidatedJson<CleanupRequest>,
) -> Result<Json<CleanupResponse>, HttpAppError> {
    let file_id = request
        .file_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("fileId is required".to_string()))?;

    uploads.reassembler.cleanup(Some(file_id)).await?;

    Ok(Json(CleanupResponse::success()))
}

/// Drop every in-flight upload and the whole temporary area
///
/// Only routed when maintenance endpoints are enabled.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/cleanup/all",
    tag = "maintenance",
    responses(
        (status = 200, description = "All temporary uploads removed", body = CleanupResponse),
        (status = 500, description = "Cleanup failed", body = ErrorResponse)
    )
)]
pub async fn cleanup_all(
    State(uploads): State<UploadState>,
) -> Result<Json<CleanupResponse>, HttpAppError> {
    tracing::warn!("Global upload cleanup requested");
    uploads.reassembler.cleanup(None).await?;
    Ok(Json(CleanupResponse::success()))
}
