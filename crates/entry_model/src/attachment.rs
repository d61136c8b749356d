//! Attachment references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to attachment bytes by URI.
///
/// While an entry is still queued the URI points at a local file; once the
/// server has stored the upload it is a remote URL. The sync queue only ever
/// inspects local references (for the existence check before upload).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef(String);

impl AttachmentRef {
    /// Create a reference from a URI.
    pub fn new(uri: impl Into<String>) -> Self {
        AttachmentRef(uri.into())
    }

    /// Get the URI.
    pub fn uri(&self) -> &str {
        &self.0
    }

    /// Check whether the reference points at a local file rather than a
    /// server-hosted URL.
    pub fn is_local(&self) -> bool {
        !self.0.starts_with("http://") && !self.0.starts_with("https://")
    }

    /// The local filesystem path for this reference, with any `file://`
    /// scheme stripped.
    pub fn local_path(&self) -> Option<&str> {
        if !self.is_local() {
            return None;
        }
        Some(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }

    /// The file name component of the URI, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|name| !name.is_empty())
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
