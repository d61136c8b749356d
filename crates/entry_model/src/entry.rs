//! The journal entry entity.

use crate::{AttachmentRef, EntryFields, EntryId, VersionToken};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A journal entry as known to the client.
///
/// Entries fetched from the server carry a `Real` id and the server's current
/// version token; placeholder entries synthesized for not-yet-synced creates
/// carry a `Temp` id and the initial token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub fields: EntryFields,
    pub attachments: Vec<AttachmentRef>,
    pub version: VersionToken,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Create an entry with the current time as both timestamps.
    pub fn new(id: impl Into<EntryId>, fields: EntryFields, version: VersionToken) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            fields,
            attachments: Vec::new(),
            version,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach references to this entry.
    pub fn with_attachments(mut self, attachments: Vec<AttachmentRef>) -> Self {
        self.attachments = attachments;
        self
    }

    /// The entry title.
    pub fn title(&self) -> &str {
        &self.fields.title
    }

    /// The entry body.
    pub fn content(&self) -> &str {
        &self.fields.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_matching_timestamps() {
        let entry = JournalEntry::new(1, EntryFields::new("A", "B"), VersionToken::new("v1"));
        assert_eq!(entry.created_at, entry.updated_at);
        assert_eq!(entry.title(), "A");
        assert_eq!(entry.content(), "B");
    }

    #[test]
    fn test_with_attachments() {
        let entry = JournalEntry::new(1, EntryFields::new("A", "B"), VersionToken::new("v1"))
            .with_attachments(vec![AttachmentRef::new("/tmp/a.jpg")]);
        assert_eq!(entry.attachments.len(), 1);
    }

    #[test]
    fn test_serde_round_trip() {
        let entry = JournalEntry::new(5, EntryFields::new("Trip", "Notes"), VersionToken::new("v3"));
        let json = serde_json::to_string(&entry).unwrap();
        let restored: JournalEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, entry);
    }
}
