//! Small helpers used around the upload pipeline.

use regex::Regex;
use std::{
    io::{self, ErrorKind},
    path::Path,
    sync::LazyLock,
};
use thiserror::Error;
use tokio::fs;

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("empty string not permitted")]
    Empty,
    #[error("after removing characters, slug is zero length")]
    NothingLeft,
}

/// Create `path` (and any missing parents) unless it already exists.
///
/// Calling it again on an existing directory is a no-op. A non-directory at
/// `path` is an error.
pub async fn create_dir_if_not_exist(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();

    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} exists and is not a directory", path.display()),
            ));
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(path).await?;

    tracing::info!("Created directory {}", path.display());
    Ok(())
}

/// Lowercase `s` and join its ASCII alphanumeric runs with `-`.
pub fn slugify(s: &str) -> Result<String, SlugError> {
    if s.is_empty() {
        return Err(SlugError::Empty);
    }

    let lowered = s.to_lowercase();
    let slug = NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        return Err(SlugError::NothingLeft);
    }
    Ok(slug)
}
