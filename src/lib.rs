//! Multipart upload ingestion: content sniffing, allow-list validation,
//! random renaming and streaming writes into a local directory, plus the
//! axum router that serves it.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

pub use models::{UploadConfiguration, UploadedFile};
pub use services::{
    naming::random_string,
    sniff::detect_content_type,
    upload_service::{IngestError, IngestResult, UploadService, ingest, ingest_one},
};
