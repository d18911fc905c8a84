//! Direct PUT of one part to its signed URL.
//!
//! The body is the part's chunk stream, wrapped so progress is reported as
//! the transport pulls bytes. A 2xx answer must carry an `ETag`; any other
//! answer fails the part on its status. Nothing is retried here.

use crate::{client::source::PartStream, models::upload::CompletedPartInfo};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderMap};
use std::{io, sync::Arc};
use thiserror::Error;
use tracing::debug;

/// Chunk size part bodies are streamed in.
pub const PROGRESS_FRAME_SIZE: usize = 64 * 1024;

/// Receives the percentage (0–100) of a part's bytes handed to the transport.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

#[derive(Debug, Error)]
pub enum PartUploadError {
    #[error("upload part {part_number} failed: {status}")]
    Status { part_number: u32, status: u16 },
    #[error("network error during part {part_number}: {source}")]
    Network {
        part_number: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("missing ETag for part {part_number}")]
    MissingETag { part_number: u32 },
}

impl PartUploadError {
    pub fn part_number(&self) -> u32 {
        match self {
            PartUploadError::Status { part_number, .. }
            | PartUploadError::Network { part_number, .. }
            | PartUploadError::MissingETag { part_number } => *part_number,
        }
    }

    /// HTTP status of the failed PUT, when the store answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            PartUploadError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PartUploader {
    http: reqwest::Client,
    frame_size: usize,
}

impl PartUploader {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            frame_size: PROGRESS_FRAME_SIZE,
        }
    }

    pub fn with_frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = frame_size.max(1);
        self
    }

    /// Chunk size to stream part bodies in.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// PUT the `len` bytes of `body` to `url` and return the part's
    /// `{ETag, PartNumber}`.
    pub async fn upload_part(
        &self,
        url: &str,
        body: PartStream,
        len: u64,
        part_number: u32,
        on_progress: ProgressFn,
    ) -> Result<CompletedPartInfo, PartUploadError> {
        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .body(reqwest::Body::wrap_stream(with_progress(
                body,
                len,
                on_progress,
            )))
            .send()
            .await
            .map_err(|source| PartUploadError::Network {
                part_number,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PartUploadError::Status {
                part_number,
                status: status.as_u16(),
            });
        }

        let e_tag = extract_etag(response.headers())
            .ok_or(PartUploadError::MissingETag { part_number })?;
        debug!(part_number, %e_tag, bytes = len, "part stored");

        Ok(CompletedPartInfo { e_tag, part_number })
    }
}

/// Report cumulative progress as each chunk of `body` is pulled.
fn with_progress(
    body: PartStream,
    total: u64,
    on_progress: ProgressFn,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let mut sent = 0u64;
    body.map_ok(move |chunk| {
        sent += chunk.len() as u64;
        if total > 0 {
            on_progress((sent as f64 * 100.0 / total as f64).min(100.0));
        }
        chunk
    })
}

/// The store's `ETag` header with surrounding quotes removed. Absent,
/// unreadable or blank tags count as missing.
pub fn extract_etag(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(ETAG)?.to_str().ok()?;
    let tag = raw.trim().trim_matches('"');
    (!tag.is_empty()).then(|| tag.to_string())
}
