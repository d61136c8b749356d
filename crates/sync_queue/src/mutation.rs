//! Mutation records: durable units of deferred work.
//!
//! Every user action taken while disconnected becomes a `MutationRecord` that
//! survives process restarts until the remote store has confirmed it. The
//! payload is a tagged union over the three mutation kinds so the sync
//! engine's dispatch is exhaustiveness-checked.

use chrono::{DateTime, Utc};
use entry_model::{AttachmentRef, EntryChanges, EntryFields, EntryId, TempId, VersionToken};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identity of a queued mutation, distinct from any entry identifier.
///
/// Used for dedup and removal; never sent to the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationId(Uuid);

impl MutationId {
    /// Generate a new unique mutation identifier.
    pub fn generate() -> Self {
        MutationId(Uuid::new_v4())
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutation kind. Closed set; extend only by adding new kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Update => write!(f, "update"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Kind-specific mutation data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MutationPayload {
    /// Create a new entry. `temp_id` is the client-minted placeholder the
    /// rest of the queue (and the optimistic view) refers to until the server
    /// assigns a real identifier.
    Create {
        temp_id: TempId,
        fields: EntryFields,
        attachments: Vec<AttachmentRef>,
    },
    /// Change fields of an existing entry. `version` is the token last
    /// observed by the client, echoed for conflict detection.
    Update {
        id: EntryId,
        changes: EntryChanges,
        version: VersionToken,
    },
    /// Delete an entry.
    Delete { id: EntryId },
}

impl MutationPayload {
    /// The kind of this payload.
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationPayload::Create { .. } => MutationKind::Create,
            MutationPayload::Update { .. } => MutationKind::Update,
            MutationPayload::Delete { .. } => MutationKind::Delete,
        }
    }

    /// The entry this mutation targets, for updates and deletes.
    pub fn target_id(&self) -> Option<EntryId> {
        match self {
            MutationPayload::Create { .. } => None,
            MutationPayload::Update { id, .. } => Some(*id),
            MutationPayload::Delete { id } => Some(*id),
        }
    }

    /// A human-readable title for notifications, when the payload carries one.
    pub fn title(&self) -> Option<&str> {
        match self {
            MutationPayload::Create { fields, .. } => Some(fields.title.as_str()),
            MutationPayload::Update { changes, .. } => changes.title.as_deref(),
            MutationPayload::Delete { .. } => None,
        }
    }
}

/// A durable unit of deferred work.
///
/// Records are mutated only by the sync engine: the retry counter on
/// recoverable failures and the version token on the conflict requeue path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Stable identity for dedup and removal.
    pub id: MutationId,
    /// Kind-specific data.
    pub payload: MutationPayload,
    /// Enqueue timestamp; replay preserves this order.
    pub created_at: DateTime<Utc>,
    /// Failed attempt count, for diagnostics and the retry cap.
    pub retry_count: u32,
    /// How many times this record has been through conflict auto-resolution.
    pub conflict_retries: u32,
}

impl MutationRecord {
    /// Create a record for a payload, assigning identity and timestamp.
    pub fn new(payload: MutationPayload) -> Self {
        Self {
            id: MutationId::generate(),
            payload,
            created_at: Utc::now(),
            retry_count: 0,
            conflict_retries: 0,
        }
    }

    /// The kind of the underlying payload.
    pub fn kind(&self) -> MutationKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_create() -> MutationPayload {
        MutationPayload::Create {
            temp_id: TempId::generate(),
            fields: EntryFields::new("Camping", "We saw a fox"),
            attachments: vec![AttachmentRef::new("/tmp/fox.jpg")],
        }
    }

    #[test]
    fn test_record_identity_is_unique() {
        let a = MutationRecord::new(make_create());
        let b = MutationRecord::new(make_create());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_kind_accessor() {
        assert_eq!(make_create().kind(), MutationKind::Create);
        assert_eq!(
            MutationPayload::Delete { id: EntryId::Real(1) }.kind(),
            MutationKind::Delete
        );
    }

    #[test]
    fn test_target_id() {
        assert_eq!(make_create().target_id(), None);

        let payload = MutationPayload::Update {
            id: EntryId::Real(5),
            changes: EntryChanges::title("X"),
            version: VersionToken::new("v1"),
        };
        assert_eq!(payload.target_id(), Some(EntryId::Real(5)));
    }

    #[test]
    fn test_title_for_notifications() {
        assert_eq!(make_create().title(), Some("Camping"));
        assert_eq!(MutationPayload::Delete { id: EntryId::Real(1) }.title(), None);
        assert_eq!(
            MutationPayload::Update {
                id: EntryId::Real(1),
                changes: EntryChanges::content("body only"),
                version: VersionToken::new("v1"),
            }
            .title(),
            None
        );
    }

    #[test]
    fn test_payload_serde_round_trip() {
        let record = MutationRecord::new(make_create());
        let json = serde_json::to_string(&record).unwrap();
        let restored: MutationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_payload_is_tagged_by_kind() {
        let json = serde_json::to_value(MutationPayload::Delete { id: EntryId::Real(3) }).unwrap();
        assert_eq!(json["kind"], "Delete");
    }
}
