//! HTTP handlers for the three multipart-upload phases.
//! Each one validates its body, delegates to `UploadService` and turns any
//! store fault into a generic 500; there is no retry and no distinction
//! between transient and permanent failures.

use crate::{
    errors::AppError,
    handlers::validated_json::ValidatedJson,
    models::upload::{
        CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest,
        InitiateUploadResponse, PresignRequest, PresignResponse,
    },
    services::upload_service::{UploadError, UploadService},
};
use axum::{Json, extract::State};
use tracing::error;

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let label = match &err {
            UploadError::Initiate(_) => "Internal server error",
            UploadError::Presign { .. } => "Failed to generate presigned URL",
            UploadError::Complete(_) => "Failed to complete multipart upload",
        };
        AppError::internal(label, err.to_string())
    }
}

/// `POST /api/upload`: start a multipart upload.
pub async fn initiate_upload(
    State(service): State<UploadService>,
    ValidatedJson(req): ValidatedJson<InitiateUploadRequest>,
) -> Result<Json<InitiateUploadResponse>, AppError> {
    let started = service
        .initiate(&req)
        .await
        .inspect_err(|err| {
            error!(error = %err, file_name = %req.file_name, "upload initiation failed")
        })?;

    Ok(Json(InitiateUploadResponse {
        success: true,
        upload_id: started.upload_id,
        key: started.key,
        bucket: started.bucket,
    }))
}

/// `POST /api/generate-presigned-url`: sign a PUT URL for every part.
pub async fn generate_presigned_urls(
    State(service): State<UploadService>,
    ValidatedJson(req): ValidatedJson<PresignRequest>,
) -> Result<Json<PresignResponse>, AppError> {
    let urls = service
        .presign_parts(&req)
        .await
        .inspect_err(|err| {
            error!(error = %err, upload_id = %req.upload_id, "presigning failed")
        })?;

    Ok(Json(PresignResponse { url: urls }))
}

/// `POST /api/complete-upload`: commit the uploaded parts.
pub async fn complete_upload(
    State(service): State<UploadService>,
    ValidatedJson(req): ValidatedJson<CompleteUploadRequest>,
) -> Result<Json<CompleteUploadResponse>, AppError> {
    let result = service
        .complete(&req)
        .await
        .inspect_err(|err| {
            error!(error = %err, upload_id = %req.upload_id, "completion failed")
        })?;

    Ok(Json(CompleteUploadResponse {
        success: true,
        result,
    }))
}
