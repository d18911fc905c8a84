//! HTTP client for the bridge's JSON endpoints.

use crate::models::upload::{
    CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest, InitiateUploadResponse,
    PresignRequest, PresignResponse,
};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint} answered {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Talks to a running bridge server at `base_url`.
#[derive(Clone, Debug)]
pub struct BridgeApi {
    http: reqwest::Client,
    base_url: String,
}

impl BridgeApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/upload`
    pub async fn initiate(
        &self,
        req: &InitiateUploadRequest,
    ) -> Result<InitiateUploadResponse, ApiError> {
        self.post_json("/api/upload", req).await
    }

    /// `POST /api/generate-presigned-url`
    pub async fn presign(&self, req: &PresignRequest) -> Result<PresignResponse, ApiError> {
        self.post_json("/api/generate-presigned-url", req).await
    }

    /// `POST /api/complete-upload`
    pub async fn complete(
        &self,
        req: &CompleteUploadRequest,
    ) -> Result<CompleteUploadResponse, ApiError> {
        self.post_json("/api/complete-upload", req).await
    }

    async fn post_json<Req, Resp>(
        &self,
        endpoint: &'static str,
        body: &Req,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let transport = |source| ApiError::Transport { endpoint, source };

        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "bridge api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Resp>().await.map_err(transport)
    }
}
