//! src/services/upload_service.rs
//!
//! UploadService: the three phases of an object-store multipart upload
//! (initiate, presign every part, complete) exposed to the HTTP handlers.
//! It holds no session state of its own: the `(upload_id, key)` pair handed
//! back to the caller is the only thing that ties the phases together, and
//! the object store is the arbiter of whether a completion is valid.

use crate::{
    models::upload::{
        CompleteUploadRequest, CompletedUpload, InitiateUploadRequest, PresignRequest,
        PresignedPartUrl,
    },
    services::object_store::{ObjectStore, StoreError},
};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::try_join_all;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Lifetime of every signed part URL.
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Value of the `upload-type` metadata entry attached at initiation.
pub const UPLOAD_TYPE_MARKER: &str = "multipart";

/// Failure of one upload phase. The display text is what the client sees
/// in the `message` field of the 500 response.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to upload file: {0}")]
    Initiate(#[source] StoreError),
    #[error("Failed to generate presigned URL: part {part_number}: {source}")]
    Presign {
        part_number: u32,
        #[source]
        source: StoreError,
    },
    #[error("Failed to complete multipart upload: {0}")]
    Complete(#[source] StoreError),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Result of starting a session: the correlation pair plus the bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitiatedUpload {
    pub upload_id: String,
    pub key: String,
    pub bucket: String,
}

#[derive(Clone)]
pub struct UploadService {
    /// Store capability shared by every handler.
    pub store: Arc<dyn ObjectStore>,

    /// Bucket fixed at startup; every session targets it.
    pub bucket: String,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Begin a multipart upload.
    ///
    /// Sanitizes the file name, picks the object key (the caller's, or a
    /// generated `uploads/<date>/<uuid>-<name>`) and attaches descriptive
    /// metadata. Fails if the store errors or hands back no upload id.
    pub async fn initiate(&self, req: &InitiateUploadRequest) -> UploadResult<InitiatedUpload> {
        let now = Utc::now();
        let sanitized = sanitize_file_name(&req.file_name);
        let key = object_key(&sanitized, req.key.as_deref(), now);
        let metadata = upload_metadata(&sanitized, req.file_size, now);

        let upload_id = self
            .store
            .begin_multipart_upload(&self.bucket, &key, &req.file_type, &metadata)
            .await
            .map_err(UploadError::Initiate)?;

        info!(%upload_id, %key, file_size = req.file_size, "multipart upload initiated");

        Ok(InitiatedUpload {
            upload_id,
            key,
            bucket: self.bucket.clone(),
        })
    }

    /// Sign one PUT URL per part number `1..=parts`.
    ///
    /// All signing calls run concurrently; the first failure fails the whole
    /// call, so callers never see a partial set.
    pub async fn presign_parts(&self, req: &PresignRequest) -> UploadResult<Vec<PresignedPartUrl>> {
        let signing = (1..=req.parts).map(|part_number| async move {
            let url = self
                .store
                .sign_part_upload_url(
                    &self.bucket,
                    &req.key,
                    &req.upload_id,
                    part_number,
                    PRESIGNED_URL_TTL,
                )
                .await
                .map_err(|source| UploadError::Presign {
                    part_number,
                    source,
                })?;
            debug!(part_number, "signed part upload url");
            Ok::<_, UploadError>(PresignedPartUrl { part_number, url })
        });

        let urls = try_join_all(signing).await?;
        info!(
            upload_id = %req.upload_id,
            key = %req.key,
            parts = urls.len(),
            "presigned part urls"
        );
        Ok(urls)
    }

    /// Commit the upload with the parts exactly as given.
    ///
    /// No local completeness check: the store rejects missing parts,
    /// mismatched ETags and unknown or expired uploads.
    pub async fn complete(&self, req: &CompleteUploadRequest) -> UploadResult<CompletedUpload> {
        let result = self
            .store
            .complete_multipart_upload(&self.bucket, &req.key, &req.upload_id, &req.parts)
            .await
            .map_err(UploadError::Complete)?;

        info!(
            upload_id = %req.upload_id,
            key = %req.key,
            parts = req.parts.len(),
            "multipart upload completed"
        );
        Ok(result)
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
///
/// Distinct names that differ only in replaced characters collide.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The caller's key when given (and non-empty), otherwise
/// `uploads/<YYYY-MM-DD>/<uuid>-<sanitized name>`.
pub fn object_key(sanitized_name: &str, requested: Option<&str>, now: DateTime<Utc>) -> String {
    match requested.filter(|key| !key.is_empty()) {
        Some(key) => key.to_string(),
        None => format!(
            "uploads/{}/{}-{}",
            now.format("%Y-%m-%d"),
            Uuid::new_v4(),
            sanitized_name
        ),
    }
}

fn upload_metadata(
    sanitized_name: &str,
    file_size: u64,
    now: DateTime<Utc>,
) -> HashMap<String, String> {
    HashMap::from([
        ("originalFileName".to_string(), sanitized_name.to_string()),
        ("fileSize".to_string(), file_size.to_string()),
        ("upload-type".to_string(), UPLOAD_TYPE_MARKER.to_string()),
        (
            "uploaded-at".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    ])
}
