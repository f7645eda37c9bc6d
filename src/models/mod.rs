//! Data models for the upload pipeline.
//!
//! Both types serialize as JSON via `serde` so the HTTP layer can return
//! them directly.

pub mod upload_config;
pub mod uploaded_file;

pub use upload_config::UploadConfiguration;
pub use uploaded_file::UploadedFile;
