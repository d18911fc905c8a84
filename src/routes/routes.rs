//! Defines routes for the multipart upload bridge.
//!
//! ## Structure
//! - **Liveness**
//!   - `GET  /`        — plain-text banner
//!   - `GET  /healthz` — JSON liveness
//!
//! - **Upload endpoints** (JSON in, JSON out)
//!   - `POST /api/upload`                 — initiate a multipart upload
//!   - `POST /api/generate-presigned-url` — sign one PUT URL per part
//!   - `POST /api/complete-upload`        — commit the uploaded parts
//!
//! CORS is wide open: browsers call the API from another origin and then
//! PUT the parts straight to the object store.

use crate::{
    handlers::{
        health_handlers::{healthz, root},
        upload_handlers::{complete_upload, generate_presigned_urls, initiate_upload},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build and return the router for the upload API.
///
/// The router carries shared state (`UploadService`) to all handlers.
pub fn routes() -> Router<UploadService> {
    let api = Router::new()
        .route("/upload", post(initiate_upload))
        .route("/generate-presigned-url", post(generate_presigned_urls))
        .route("/complete-upload", post(complete_upload));

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
