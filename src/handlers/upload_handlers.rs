//! HTTP handlers for uploads and downloads.
//! Request bodies are streamed part by part into the upload directory and
//! downloads are streamed back from disk; neither is buffered in memory.

use crate::{errors::AppError, models::UploadedFile, services::upload_service::UploadService};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio_util::io::ReaderStream;

/// Envelope for `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadFilesResponse {
    pub error: bool,
    pub message: String,
    pub files: Vec<UploadedFile>,
}

/// Envelope for `POST /upload/one`.
#[derive(Debug, Serialize)]
pub struct UploadOneResponse {
    pub error: bool,
    pub message: String,
    pub file: UploadedFile,
}

/// `POST /upload` — store every file part of a multipart form.
pub async fn upload_files(
    State(service): State<UploadService>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let files = service.upload_files(&mut multipart).await?;

    let body = UploadFilesResponse {
        error: false,
        message: format!("{} file(s) uploaded", files.len()),
        files,
    };
    Ok((StatusCode::OK, Json(body)))
}

/// `POST /upload/one` — store the first file part under a generated name.
pub async fn upload_one(
    State(service): State<UploadService>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = service.upload_one(&mut multipart).await?;

    let body = UploadOneResponse {
        error: false,
        message: format!("uploaded {}", file.original_name),
        file,
    };
    Ok((StatusCode::OK, Json(body)))
}

/// `GET /files/{name}` — download a stored file as an attachment.
pub async fn download_file(
    State(service): State<UploadService>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let (name, file, len) = service.open_file(&name).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    set_download_headers(response.headers_mut(), &name, len);
    Ok(response)
}

fn set_download_headers(headers: &mut HeaderMap, name: &str, len: u64) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', "\\\""));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
}
