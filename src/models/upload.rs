//! Wire contract for the three multipart-upload endpoints.
//!
//! Field names follow the JSON the browser client already speaks: camelCase
//! for the session fields, and the object store's own `ETag` / `PartNumber`
//! spelling for completed parts. The same types are used by the Rust upload
//! client, so server and client cannot drift apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest part number an S3-style multipart upload accepts.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// Body of `POST /api/upload`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadRequest {
    /// Original file name as picked by the user. Sanitized before use.
    pub file_name: String,

    /// MIME type recorded as the object's content type.
    pub file_type: String,

    /// Total size in bytes; must be at least 1.
    pub file_size: u64,

    /// Explicit object key. When absent (or empty) the server generates one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Successful response of `POST /api/upload`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadResponse {
    pub success: bool,
    pub upload_id: String,
    pub key: String,
    pub bucket: String,
}

/// Body of `POST /api/generate-presigned-url`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub upload_id: String,
    pub key: String,

    /// Number of parts to sign; part numbers `1..=parts` are issued.
    pub parts: u32,
}

/// One signed PUT URL, tagged with the part it is bound to.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresignedPartUrl {
    pub part_number: u32,
    pub url: String,
}

/// Successful response of `POST /api/generate-presigned-url`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PresignResponse {
    pub url: Vec<PresignedPartUrl>,
}

/// A part the store has acknowledged, as required to finalize the upload.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompletedPartInfo {
    #[serde(rename = "ETag")]
    pub e_tag: String,

    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

/// Body of `POST /api/complete-upload`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<CompletedPartInfo>,
}

/// What the object store reports after assembling the parts.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CompletedUpload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// Successful response of `POST /api/complete-upload`: the store result
/// flattened next to the `success` flag.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CompleteUploadResponse {
    pub success: bool,

    #[serde(flatten)]
    pub result: CompletedUpload,
}

/// A single rejected field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// All the ways a request body broke the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                message: message.into(),
            }],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationError {}

/// Request-level validation rules applied after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Collects issues so one response can report every broken field.
#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(field, "must not be empty");
        }
    }

    fn require_part_number(&mut self, field: impl Into<String>, value: u32) {
        if value < 1 {
            self.push(field, "must be greater than or equal to 1");
        } else if value > MAX_PART_NUMBER {
            self.push(
                field,
                format!("must be less than or equal to {}", MAX_PART_NUMBER),
            );
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues: self.0 })
        }
    }
}

impl Validate for InitiateUploadRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::default();
        if self.file_size < 1 {
            issues.push("fileSize", "must be greater than or equal to 1");
        }
        issues.finish()
    }
}

impl Validate for PresignRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::default();
        issues.require_non_empty("uploadId", &self.upload_id);
        issues.require_non_empty("key", &self.key);
        issues.require_part_number("parts", self.parts);
        issues.finish()
    }
}

impl Validate for CompleteUploadRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Issues::default();
        issues.require_non_empty("uploadId", &self.upload_id);
        issues.require_non_empty("key", &self.key);
        for (index, part) in self.parts.iter().enumerate() {
            issues.require_part_number(format!("parts[{}].PartNumber", index), part.part_number);
        }
        issues.finish()
    }
}
