//! Represents a file persisted by the upload ingestor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result record for one successfully ingested multipart file part.
///
/// Built once per written file and never mutated afterwards. Removing the
/// file from disk is left to the caller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name declared by the client, reduced to its final path component.
    /// Untrusted; used for display and extension inference only.
    pub original_name: String,

    /// Name under which the bytes were written inside the destination directory.
    pub new_name: String,

    /// Number of bytes written to disk.
    pub size_bytes: u64,

    /// MIME type sniffed from the leading bytes of the part.
    pub content_type: String,

    /// Lowercase hex MD5 of the persisted bytes.
    pub etag: String,

    /// When the file finished writing.
    pub uploaded_at: DateTime<Utc>,
}
