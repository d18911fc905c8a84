use crate::client::{api::ApiError, splitter::SplitError, uploader::PartUploadError};
use thiserror::Error;

/// Everything that can end a client upload session. All variants are
/// handled the same way: the session is over and nothing is rolled back.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("failed to initialize upload: {0}")]
    Initiate(#[source] ApiError),

    #[error("failed to get presigned URLs: {0}")]
    Presign(#[source] ApiError),

    #[error("presigned URLs do not match parts: expected {expected:?}, received {received:?}")]
    PresignMismatch {
        expected: Vec<u32>,
        received: Vec<u32>,
    },

    #[error(transparent)]
    Part(#[from] PartUploadError),

    #[error("failed to complete upload: {0}")]
    Complete(#[source] ApiError),
}

impl ClientError {
    /// Part number of the part whose failure ended the session, if any.
    pub fn failed_part(&self) -> Option<u32> {
        match self {
            ClientError::Part(err) => Some(err.part_number()),
            _ => None,
        }
    }
}
