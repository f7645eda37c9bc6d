//! src/services/upload_service.rs
//!
//! Multipart ingestion: reads file parts one at a time, sniffs their real
//! content type, checks it against the allow-list, names the file and
//! streams the bytes into the destination directory. Parts are processed
//! strictly in arrival order; the first fatal error ends the call.

use crate::{
    models::{UploadConfiguration, UploadedFile},
    services::{
        naming::{base_name, generated_file_name, sanitize_file_name},
        sniff::{SNIFF_LEN, detect_content_type},
    },
};
use axum::extract::multipart::{Field, Multipart, MultipartError};
use bytes::Bytes;
use chrono::Utc;
use md5::Context;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed multipart body: {0}")]
    MalformedMultipart(String),
    #[error("file `{file_name}` has disallowed content type `{content_type}`")]
    InvalidFileType {
        file_name: String,
        content_type: String,
    },
    #[error("file `{file_name}` exceeds the maximum size of {limit} bytes")]
    FileTooLarge { file_name: String, limit: u64 },
    #[error("no file provided")]
    NoFileProvided,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<MultipartError> for IngestError {
    fn from(err: MultipartError) -> Self {
        IngestError::MalformedMultipart(err.body_text())
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Ingest every file part of `multipart` into `destination_dir`.
///
/// Returns the written files in arrival order. A body without file parts
/// yields an empty vector. The destination directory must already exist.
pub async fn ingest(
    multipart: &mut Multipart,
    destination_dir: &Path,
    config: &UploadConfiguration,
) -> IngestResult<Vec<UploadedFile>> {
    ingest_parts(multipart, destination_dir, config, None).await
}

/// Single-file variant: always renames and persists only the first file part.
pub async fn ingest_one(
    multipart: &mut Multipart,
    destination_dir: &Path,
    config: &UploadConfiguration,
) -> IngestResult<UploadedFile> {
    let config = UploadConfiguration {
        rename: true,
        ..config.clone()
    };

    ingest_parts(multipart, destination_dir, &config, Some(1))
        .await?
        .pop()
        .ok_or(IngestError::NoFileProvided)
}

async fn ingest_parts(
    multipart: &mut Multipart,
    destination_dir: &Path,
    config: &UploadConfiguration,
    max_files: Option<usize>,
) -> IngestResult<Vec<UploadedFile>> {
    let mut written = Vec::new();

    match collect_parts(multipart, destination_dir, config, max_files, &mut written).await {
        Ok(()) => Ok(written),
        Err(err) => {
            if config.rollback_on_error {
                rollback(destination_dir, &written).await;
            }
            Err(err)
        }
    }
}

async fn collect_parts(
    multipart: &mut Multipart,
    destination_dir: &Path,
    config: &UploadConfiguration,
    max_files: Option<usize>,
    written: &mut Vec<UploadedFile>,
) -> IngestResult<()> {
    while max_files.is_none_or(|max| written.len() < max) {
        let Some(mut field) = multipart.next_field().await? else {
            break;
        };

        // Plain form values and empty file inputs carry no file name.
        let Some(declared) = field
            .file_name()
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
        else {
            drain(&mut field).await?;
            continue;
        };
        let original_name = base_name(&declared).to_string();

        let prefix = read_prefix(&mut field).await?;
        let content_type = detect_content_type(&prefix);

        if !config.is_allowed(content_type) {
            if config.skip_disallowed {
                warn!(
                    file_name = %original_name,
                    content_type,
                    "skipping file with disallowed content type"
                );
                drain(&mut field).await?;
                continue;
            }
            return Err(IngestError::InvalidFileType {
                file_name: original_name,
                content_type: content_type.to_string(),
            });
        }

        let new_name = persisted_name(&declared, config.rename)?;
        let path = destination_dir.join(&new_name);
        let (size_bytes, etag) =
            write_part(&mut field, prefix, &path, config.size_limit(), &original_name).await?;

        info!(
            file_name = %original_name,
            new_name = %new_name,
            size_bytes,
            content_type,
            "stored uploaded file"
        );

        written.push(UploadedFile {
            original_name,
            new_name,
            size_bytes,
            content_type: content_type.to_string(),
            etag,
            uploaded_at: Utc::now(),
        });
    }

    Ok(())
}

/// Buffer chunks until at least [`SNIFF_LEN`] bytes (or the whole part) are
/// available. The buffer is written out in full before the rest of the part.
async fn read_prefix(field: &mut Field<'_>) -> IngestResult<Vec<u8>> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    while prefix.len() < SNIFF_LEN {
        match field.chunk().await? {
            Some(chunk) => prefix.extend_from_slice(&chunk),
            None => break,
        }
    }
    Ok(prefix)
}

async fn drain(field: &mut Field<'_>) -> IngestResult<()> {
    while field.chunk().await?.is_some() {}
    Ok(())
}

fn persisted_name(declared: &str, rename: bool) -> IngestResult<String> {
    let sanitized = if rename {
        None
    } else {
        sanitize_file_name(declared)
    };

    match sanitized {
        Some(name) => Ok(name),
        None => generated_file_name(declared)
            .map_err(|err| IngestError::Io(io::Error::other(err.to_string()))),
    }
}

/// Create `path` exclusively and stream the part into it.
///
/// On failure the partially written file is removed best-effort.
async fn write_part(
    field: &mut Field<'_>,
    prefix: Vec<u8>,
    path: &Path,
    limit: Option<u64>,
    file_name: &str,
) -> IngestResult<(u64, String)> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    match copy_part(&mut file, field, prefix, limit, file_name).await {
        Ok(result) => Ok(result),
        Err(err) => {
            drop(file);
            if let Err(remove_err) = fs::remove_file(path).await {
                debug!(
                    "failed to remove partial upload {}: {}",
                    path.display(),
                    remove_err
                );
            }
            Err(err)
        }
    }
}

async fn copy_part(
    file: &mut File,
    field: &mut Field<'_>,
    prefix: Vec<u8>,
    limit: Option<u64>,
    file_name: &str,
) -> IngestResult<(u64, String)> {
    let mut size_bytes: u64 = 0;
    let mut digest = Context::new();
    let mut pending = Some(Bytes::from(prefix));

    loop {
        let chunk = match pending.take() {
            Some(chunk) => chunk,
            None => match field.chunk().await? {
                Some(chunk) => chunk,
                None => break,
            },
        };

        size_bytes += chunk.len() as u64;
        if let Some(limit) = limit.filter(|limit| size_bytes > *limit) {
            return Err(IngestError::FileTooLarge {
                file_name: file_name.to_string(),
                limit,
            });
        }

        digest.consume(&chunk);
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok((size_bytes, format!("{:x}", digest.compute())))
}

/// Remove files written earlier in a call that later failed.
async fn rollback(destination_dir: &Path, written: &[UploadedFile]) {
    for file in written {
        let path = destination_dir.join(&file.new_name);
        match fs::remove_file(&path).await {
            Ok(_) => debug!("rolled back {}", path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("failed to roll back {}: {}", path.display(), err),
        }
    }
}

/// UploadService binds an upload directory and a fixed policy together so
/// HTTP handlers can share them as router state.
#[derive(Clone, Debug)]
pub struct UploadService {
    /// Directory uploads are written to and downloads are served from.
    pub upload_dir: PathBuf,

    /// Policy applied to every request handled by this service.
    pub config: Arc<UploadConfiguration>,
}

impl UploadService {
    pub fn new(upload_dir: impl Into<PathBuf>, config: UploadConfiguration) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            config: Arc::new(config),
        }
    }

    pub async fn upload_files(&self, multipart: &mut Multipart) -> IngestResult<Vec<UploadedFile>> {
        ingest(multipart, &self.upload_dir, &self.config).await
    }

    pub async fn upload_one(&self, multipart: &mut Multipart) -> IngestResult<UploadedFile> {
        ingest_one(multipart, &self.upload_dir, &self.config).await
    }

    /// Open a stored file for download.
    ///
    /// The requested name goes through the same sanitization as uploads, so
    /// it can never point outside the upload directory.
    pub async fn open_file(&self, name: &str) -> IngestResult<(String, File, u64)> {
        let safe_name = sanitize_file_name(name)
            .filter(|safe| safe == name)
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "invalid file name"))?;

        let path = self.upload_dir.join(&safe_name);
        let file = File::open(&path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(io::Error::new(ErrorKind::NotFound, "not a regular file").into());
        }

        Ok((safe_name, file, metadata.len()))
    }
}
