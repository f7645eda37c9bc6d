//! Caller-supplied policy for one ingestion call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Upload policy, read-only for the duration of a call.
///
/// Passed by reference into every ingestion; concurrent calls can use
/// different policies without interfering.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadConfiguration {
    /// Accepted MIME types. Empty means every type is accepted.
    pub allowed_mime_types: BTreeSet<String>,

    /// Per-file ceiling in bytes. `None` or `Some(0)` disables the cap.
    pub max_file_size: Option<u64>,

    /// Give every persisted file a freshly generated name.
    pub rename: bool,

    /// Drain and skip disallowed parts instead of failing the whole call.
    #[serde(default)]
    pub skip_disallowed: bool,

    /// Remove files written earlier in the same call when a later part fails.
    #[serde(default)]
    pub rollback_on_error: bool,
}

impl UploadConfiguration {
    pub fn new<I, S>(allowed_mime_types: I, rename: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_mime_types: allowed_mime_types
                .into_iter()
                .map(|s| s.into().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            rename,
            ..Self::default()
        }
    }

    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = Some(limit);
        self
    }

    pub fn with_skip_disallowed(mut self, skip: bool) -> Self {
        self.skip_disallowed = skip;
        self
    }

    pub fn with_rollback_on_error(mut self, rollback: bool) -> Self {
        self.rollback_on_error = rollback;
        self
    }

    /// Effective size cap; zero counts as unlimited.
    pub fn size_limit(&self) -> Option<u64> {
        self.max_file_size.filter(|limit| *limit > 0)
    }

    /// Check a sniffed content type against the allow-list.
    ///
    /// Entries without parameters match on the essence (`type/subtype`),
    /// so `text/plain` accepts `text/plain; charset=utf-8`.
    pub fn is_allowed(&self, content_type: &str) -> bool {
        if self.allowed_mime_types.is_empty() {
            return true;
        }

        let full = content_type.trim().to_ascii_lowercase();
        let essence = full.split(';').next().unwrap_or_default().trim();

        self.allowed_mime_types.iter().any(|allowed| {
            if allowed.contains(';') {
                allowed.replace(' ', "").eq_ignore_ascii_case(&full.replace(' ', ""))
            } else {
                allowed.trim().eq_ignore_ascii_case(essence)
            }
        })
    }
}
