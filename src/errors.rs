use crate::models::upload::{FieldIssue, ValidationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Label used for every rejected request body.
pub const INVALID_REQUEST_LABEL: &str = "Invalid request data";

/// HTTP-facing error: a status, a short label for the `error` field and
/// either a free-form message or the list of rejected fields.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub label: String,
    pub message: String,
    pub details: Option<Vec<FieldIssue>>,
}

impl AppError {
    /// Create a new AppError with a specific status, label and message.
    pub fn new(status: StatusCode, label: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            label: label.into(),
            message: msg.into(),
            details: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(label: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, label, msg)
    }

    /// Shortcut for a 400 carrying per-field detail.
    pub fn validation(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            label: INVALID_REQUEST_LABEL.into(),
            message: err.to_string(),
            details: Some(err.issues),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => Json(json!({
                "error": self.label,
                "details": details,
            })),
            None => Json(json!({
                "error": self.label,
                "message": self.message,
            })),
        };

        (self.status, body).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err)
    }
}
