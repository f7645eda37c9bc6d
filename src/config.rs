use crate::models::UploadConfiguration;
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;
const DEFAULT_ALLOWED_TYPES: &str = "image/jpeg,image/png,image/gif,application/pdf";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub allowed_types: Vec<String>,
    pub max_file_size: u64,
    pub max_request_bytes: usize,
    pub rename: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Multipart upload ingestion service")]
pub struct Args {
    /// Host to bind to (overrides UPLOAD_TOOLKIT_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides UPLOAD_TOOLKIT_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory uploads are written to (overrides UPLOAD_TOOLKIT_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Comma-separated MIME allow-list; empty accepts everything
    /// (overrides UPLOAD_TOOLKIT_ALLOWED_TYPES)
    #[arg(long)]
    pub allowed_types: Option<String>,

    /// Per-file size cap in bytes, 0 disables it (overrides UPLOAD_TOOLKIT_MAX_FILE_SIZE)
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Whole-request body limit in bytes (overrides UPLOAD_TOOLKIT_MAX_REQUEST_BYTES)
    #[arg(long)]
    pub max_request_bytes: Option<usize>,

    /// Give every upload a random name (overrides UPLOAD_TOOLKIT_RENAME)
    #[arg(long)]
    pub rename: Option<bool>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::merge(Args::parse())
    }

    /// Merge already-parsed CLI args over the environment and defaults.
    pub fn merge(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = env::var("UPLOAD_TOOLKIT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parsed("UPLOAD_TOOLKIT_PORT", 3000u16)?;
        let env_upload_dir =
            env::var("UPLOAD_TOOLKIT_UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".into());
        let env_allowed = env::var("UPLOAD_TOOLKIT_ALLOWED_TYPES")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_TYPES.into());
        let env_max_file = env_parsed("UPLOAD_TOOLKIT_MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        let env_max_request = env_parsed(
            "UPLOAD_TOOLKIT_MAX_REQUEST_BYTES",
            DEFAULT_MAX_FILE_SIZE as usize + 1024 * 1024,
        )?;
        let env_rename = env_parsed("UPLOAD_TOOLKIT_RENAME", true)?;

        // --- Merge ---
        let allowed = args.allowed_types.unwrap_or(env_allowed);
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            upload_dir: args.upload_dir.unwrap_or(env_upload_dir),
            allowed_types: split_list(&allowed),
            max_file_size: args.max_file_size.unwrap_or(env_max_file),
            max_request_bytes: args.max_request_bytes.unwrap_or(env_max_request),
            rename: args.rename.unwrap_or(env_rename),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload policy shared by every request.
    pub fn upload_policy(&self) -> UploadConfiguration {
        UploadConfiguration::new(self.allowed_types.iter().cloned(), self.rename)
            .with_max_file_size(self.max_file_size)
    }
}

fn env_parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
