//! Liveness handlers.
//!
//! - GET /         -> plain-text banner
//! - GET /healthz  -> JSON liveness ("ok") for orchestrators

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

pub const LIVENESS_BANNER: &str = "Bulk Bridge Server is running";

/// `GET /`
pub async fn root() -> &'static str {
    LIVENESS_BANNER
}

/// `GET /healthz`
///
/// Always 200 with a tiny JSON body. Never touches the object store: the
/// bridge keeps no state that could be unhealthy on its own.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}
