//! Version tokens for optimistic concurrency control.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque per-entry value returned by the remote store.
///
/// The client never interprets the token; it only echoes the last observed
/// value back with an update so the server can detect concurrent writes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(String);

impl VersionToken {
    /// Create a token from an opaque server-provided value.
    pub fn new(token: impl Into<String>) -> Self {
        VersionToken(token.into())
    }

    /// Token for an entry that has never been stored remotely.
    pub fn initial() -> Self {
        VersionToken(String::new())
    }

    /// Get the raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is the initial token, meaning the client has never
    /// observed a server version for the entry.
    pub fn is_initial(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
