//! Object-store capability consumed by the upload endpoints.
//!
//! The bridge never touches file bytes. All it needs from the store is the
//! three multipart primitives: begin an upload, sign a PUT URL for one part,
//! and commit the parts. `S3ObjectStore` provides them on top of the AWS SDK;
//! tests swap in an in-memory implementation.

use crate::models::upload::{CompletedPartInfo, CompletedUpload};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as AwsS3Client,
    config::{Credentials, Region},
    error::DisplayErrorContext,
    presigning::PresigningConfig,
    types::{CompletedMultipartUpload, CompletedPart},
};
use std::{collections::HashMap, fmt, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object store request failed: {0}")]
    Sdk(String),
    #[error("Failed to initiate multipart upload")]
    MissingUploadId,
    #[error("invalid presign expiry: {0}")]
    InvalidExpiry(String),
    #[error("part number {0} is out of range")]
    InvalidPartNumber(u32),
    #[error("{0}")]
    Rejected(String),
}

impl StoreError {
    /// Flatten an SDK error, including its source chain, into a message.
    pub fn from_sdk<E: std::error::Error>(err: E) -> Self {
        StoreError::Sdk(DisplayErrorContext(err).to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Multipart primitives of an S3-compatible object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Start a multipart upload and return the store-assigned upload id.
    async fn begin_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> StoreResult<String>;

    /// Sign a PUT URL scoped to exactly one part of one upload.
    async fn sign_part_upload_url(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> StoreResult<String>;

    /// Assemble the uploaded parts, in the order given, into one object.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> StoreResult<CompletedUpload>;
}

/// Connection settings for the S3 adapter.
#[derive(Clone)]
pub struct S3Settings {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// `ObjectStore` backed by the AWS SDK for S3.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: AwsS3Client,
}

impl S3ObjectStore {
    /// Build an SDK client from explicit static credentials.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "bulk-bridge",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if settings.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: AwsS3Client::from_conf(builder.build()),
        }
    }
}

fn sdk_part_number(part_number: u32) -> StoreResult<i32> {
    i32::try_from(part_number).map_err(|_| StoreError::InvalidPartNumber(part_number))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn begin_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> StoreResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(StoreError::from_sdk)?;

        output
            .upload_id()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or(StoreError::MissingUploadId)
    }

    async fn sign_part_upload_url(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> StoreResult<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|err| StoreError::InvalidExpiry(err.to_string()))?;

        let request = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(sdk_part_number(part_number)?)
            .presigned(presigning)
            .await
            .map_err(StoreError::from_sdk)?;

        Ok(request.uri().to_string())
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> StoreResult<CompletedUpload> {
        let completed_parts = parts
            .iter()
            .map(|part| {
                Ok(CompletedPart::builder()
                    .part_number(sdk_part_number(part.part_number)?)
                    .e_tag(&part.e_tag)
                    .build())
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed_parts))
                    .build(),
            )
            .send()
            .await
            .map_err(StoreError::from_sdk)?;

        Ok(CompletedUpload {
            location: output.location().map(str::to_string),
            bucket: output.bucket().map(str::to_string),
            key: output.key().map(str::to_string),
            e_tag: output.e_tag().map(str::to_string),
            version_id: output.version_id().map(str::to_string),
        })
    }
}
