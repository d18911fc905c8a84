//! Drives one file through the whole multipart protocol:
//! split → initiate → presign all → upload all parts → complete.
//!
//! Part uploads fan out concurrently (optionally capped by a worker limit)
//! and every launched upload is allowed to settle before the session is
//! judged, so the status board never shows a part stuck mid-flight. Any
//! failure ends the session in `error`; uploaded parts are left as they are
//! and the store-side upload is not aborted.

use crate::{
    client::{
        api::BridgeApi,
        error::ClientError,
        source::PartSource,
        splitter::{MAX_PART_SIZE, PartRange, split_parts},
        status::{PartEvent, StatusBoard, UploadSnapshot},
        uploader::{PartUploader, ProgressFn},
    },
    models::upload::{
        CompleteUploadRequest, CompletedPartInfo, CompletedUpload, InitiateUploadRequest,
        PresignRequest, PresignedPartUrl,
    },
};
use futures::{StreamExt, future::join_all, stream};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Describes the file being uploaded.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub name: String,
    pub content_type: String,
    /// Explicit object key; the server generates one when `None`.
    pub key: Option<String>,
}

/// A finished session.
#[derive(Clone, Debug)]
pub struct UploadOutcome {
    pub upload_id: String,
    pub key: String,
    pub bucket: String,
    /// Ascending by part number, exactly as sent to the finalizer.
    pub parts: Vec<CompletedPartInfo>,
    pub result: CompletedUpload,
}

pub struct SessionCoordinator {
    api: BridgeApi,
    uploader: PartUploader,
    board: StatusBoard,
    part_size: u64,
    max_concurrency: Option<usize>,
}

impl SessionCoordinator {
    pub fn new(api: BridgeApi, uploader: PartUploader) -> Self {
        Self {
            api,
            uploader,
            board: StatusBoard::new(),
            part_size: MAX_PART_SIZE,
            max_concurrency: None,
        }
    }

    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }

    /// Cap the number of part PUTs in flight. `None` uploads every part at once.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit.map(|n| n.max(1));
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadSnapshot> {
        self.board.subscribe()
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        self.board.snapshot()
    }

    /// Upload `source` as one object. Starting again (same or another file)
    /// begins an unrelated session; nothing from a previous one is reused.
    pub async fn upload(
        &self,
        file: &FileInfo,
        source: &dyn PartSource,
    ) -> Result<UploadOutcome, ClientError> {
        let outcome = self.run(file, source).await;
        match &outcome {
            Ok(done) => {
                info!(
                    upload_id = %done.upload_id,
                    key = %done.key,
                    parts = done.parts.len(),
                    "upload complete"
                );
                self.board.finish(Ok(()));
            }
            Err(err) => {
                error!(error = %err, file = %file.name, "upload failed");
                self.board.finish(Err(err.to_string()));
            }
        }
        outcome
    }

    async fn run(
        &self,
        file: &FileInfo,
        source: &dyn PartSource,
    ) -> Result<UploadOutcome, ClientError> {
        let ranges = match split_parts(source.len(), self.part_size) {
            Ok(ranges) => ranges,
            Err(err) => {
                self.board.begin(&file.name, &[]);
                return Err(err.into());
            }
        };
        self.board.begin(&file.name, &ranges);

        let init = self
            .api
            .initiate(&InitiateUploadRequest {
                file_name: file.name.clone(),
                file_type: file.content_type.clone(),
                file_size: source.len(),
                key: file.key.clone(),
            })
            .await
            .map_err(ClientError::Initiate)?;
        info!(
            upload_id = %init.upload_id,
            key = %init.key,
            parts = ranges.len(),
            "upload initiated"
        );

        let presigned = self
            .api
            .presign(&PresignRequest {
                upload_id: init.upload_id.clone(),
                key: init.key.clone(),
                parts: ranges.len() as u32,
            })
            .await
            .map_err(ClientError::Presign)?;
        let urls = match_urls(&ranges, presigned.url)?;

        let uploads = ranges
            .iter()
            .zip(urls)
            .map(|(range, url)| self.upload_one(source, *range, url));
        let settled: Vec<Result<CompletedPartInfo, ClientError>> = match self.max_concurrency {
            None => join_all(uploads).await,
            Some(limit) => stream::iter(uploads).buffered(limit).collect().await,
        };

        let mut parts = settled.into_iter().collect::<Result<Vec<_>, _>>()?;
        parts.sort_by_key(|part| part.part_number);
        info!(upload_id = %init.upload_id, parts = parts.len(), "all parts uploaded");

        let completed = self
            .api
            .complete(&CompleteUploadRequest {
                upload_id: init.upload_id.clone(),
                key: init.key.clone(),
                parts: parts.clone(),
            })
            .await
            .map_err(ClientError::Complete)?;

        Ok(UploadOutcome {
            upload_id: init.upload_id,
            key: init.key,
            bucket: init.bucket,
            parts,
            result: completed.result,
        })
    }

    async fn upload_one(
        &self,
        source: &dyn PartSource,
        range: PartRange,
        url: String,
    ) -> Result<CompletedPartInfo, ClientError> {
        let part_number = range.part_number;
        self.board.apply(part_number, PartEvent::Started);

        let body = source.stream_range(range.as_range(), self.uploader.frame_size());
        let board = self.board.clone();
        let on_progress: ProgressFn =
            Arc::new(move |percent| board.apply(part_number, PartEvent::Progress(percent)));

        let uploaded = self
            .uploader
            .upload_part(&url, body, range.len(), part_number, on_progress)
            .await;
        match uploaded {
            Ok(part) => {
                self.board.apply(
                    part_number,
                    PartEvent::Completed {
                        e_tag: part.e_tag.clone(),
                    },
                );
                Ok(part)
            }
            Err(err) => {
                self.board.apply(part_number, PartEvent::Failed);
                Err(err.into())
            }
        }
    }
}

/// Sort the presigned URLs by part number and check they line up one-to-one
/// with the local parts before anything is uploaded.
fn match_urls(
    ranges: &[PartRange],
    mut urls: Vec<PresignedPartUrl>,
) -> Result<Vec<String>, ClientError> {
    urls.sort_by_key(|entry| entry.part_number);

    let expected: Vec<u32> = ranges.iter().map(|range| range.part_number).collect();
    let received: Vec<u32> = urls.iter().map(|entry| entry.part_number).collect();
    if expected != received {
        return Err(ClientError::PresignMismatch { expected, received });
    }

    Ok(urls.into_iter().map(|entry| entry.url).collect())
}
