//! Defines routes for the upload service.
//!
//! ## Structure
//! - `POST /upload`       — store every file part of a multipart form
//! - `POST /upload/one`   — store a single file under a generated name
//! - `GET  /files/{name}` — download a stored file as an attachment
//! - `GET  /healthz`, `GET /readyz` — probes

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{download_file, upload_files, upload_one},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build the router for all upload routes.
///
/// `max_request_bytes` caps whole request bodies; the per-file cap lives in
/// the service's upload policy.
pub fn routes(max_request_bytes: usize) -> Router<UploadService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/upload", post(upload_files))
        .route("/upload/one", post(upload_one))
        .route("/files/{name}", get(download_file))
        .layer(DefaultBodyLimit::max(max_request_bytes))
}
