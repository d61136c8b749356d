//! Conflict resolution types for update mutations.
//!
//! A version conflict is never resolved by blind overwrite of either side.
//! The first conflict on a record is auto-resolved by refreshing the queued
//! version token and requeueing at the back of the queue (last-write-wins on
//! the next run; field-level merge is out of scope). A record that conflicts
//! again after a refresh, or whose authoritative fetch fails, is pulled out
//! of the queue and surfaced as a `ConflictNotice` so the user can decide.

use crate::mutation::{MutationId, MutationPayload, MutationRecord};
use chrono::{DateTime, Utc};
use entry_model::{EntryChanges, EntryId, JournalEntry, VersionToken};
use serde::{Deserialize, Serialize};

/// How a single conflict was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictOutcome {
    /// Version token refreshed, record requeued for the next run.
    AutoResolved,
    /// Surfaced to the user with both revisions.
    UserPrompted,
    /// Authoritative fetch failed; surfaced to the user with the local
    /// revision only.
    FetchFailedDiscarded,
}

/// The user's answer to a surfaced conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictDecision {
    /// Re-queue the local change over the remote revision.
    KeepLocal,
    /// Drop the local change in favor of the remote revision.
    UseRemote,
    /// Drop the local change without taking a side.
    Cancel,
}

/// The server's revision of a conflicted entry, for display next to the
/// local one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRevision {
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub version: VersionToken,
}

impl From<&JournalEntry> for RemoteRevision {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            title: entry.fields.title.clone(),
            content: entry.fields.content.clone(),
            updated_at: entry.updated_at,
            version: entry.version.clone(),
        }
    }
}

/// A conflict that needs a user decision.
///
/// Carries both sides with enough structure for the UI layer to render a
/// keep-local / use-remote / cancel prompt, and enough state to re-queue the
/// local change if the user keeps it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictNotice {
    /// Identity of the mutation that was pulled from the queue.
    pub mutation_id: MutationId,
    /// The entry both sides are fighting over.
    pub entry_id: EntryId,
    /// The locally queued field overrides.
    pub changes: EntryChanges,
    /// When the local change was queued.
    pub queued_at: DateTime<Utc>,
    /// The version token the client last observed.
    pub last_seen_version: VersionToken,
    /// The server's revision; `None` when the authoritative fetch failed.
    pub remote: Option<RemoteRevision>,
}

impl ConflictNotice {
    /// Build a notice from a queued update record.
    ///
    /// Returns `None` for non-update records, which cannot conflict.
    pub fn from_record(record: &MutationRecord, remote: Option<&JournalEntry>) -> Option<Self> {
        let MutationPayload::Update { id, changes, version } = &record.payload else {
            return None;
        };

        Some(Self {
            mutation_id: record.id,
            entry_id: *id,
            changes: changes.clone(),
            queued_at: record.created_at,
            last_seen_version: version.clone(),
            remote: remote.map(RemoteRevision::from),
        })
    }

    /// The locally queued title, if the change set touches it.
    pub fn local_title(&self) -> Option<&str> {
        self.changes.title.as_deref()
    }

    /// The locally queued content, if the change set touches it.
    pub fn local_content(&self) -> Option<&str> {
        self.changes.content.as_deref()
    }
}

/// Conflict accounting.
///
/// Every conflict lands in exactly one bucket, so
/// `total == auto_resolved + user_prompted + fetch_failed_discards` holds at
/// all times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictStats {
    pub total: usize,
    pub auto_resolved: usize,
    pub user_prompted: usize,
    pub fetch_failed_discards: usize,
}

impl ConflictStats {
    /// Count an outcome.
    pub fn record(&mut self, outcome: ConflictOutcome) {
        self.total += 1;
        match outcome {
            ConflictOutcome::AutoResolved => self.auto_resolved += 1,
            ConflictOutcome::UserPrompted => self.user_prompted += 1,
            ConflictOutcome::FetchFailedDiscarded => self.fetch_failed_discards += 1,
        }
    }

    /// Check the accounting invariant.
    pub fn is_balanced(&self) -> bool {
        self.total == self.auto_resolved + self.user_prompted + self.fetch_failed_discards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entry_model::{EntryFields, TempId};

    fn make_update_record() -> MutationRecord {
        MutationRecord::new(MutationPayload::Update {
            id: EntryId::Real(5),
            changes: EntryChanges::title("local title"),
            version: VersionToken::new("v1"),
        })
    }

    #[test]
    fn test_notice_from_update_record() {
        let record = make_update_record();
        let remote = JournalEntry::new(5, EntryFields::new("remote title", "remote body"),
            VersionToken::new("v2"));

        let notice = ConflictNotice::from_record(&record, Some(&remote)).unwrap();

        assert_eq!(notice.mutation_id, record.id);
        assert_eq!(notice.entry_id, EntryId::Real(5));
        assert_eq!(notice.local_title(), Some("local title"));
        assert_eq!(notice.local_content(), None);
        assert_eq!(notice.last_seen_version, VersionToken::new("v1"));

        let remote_side = notice.remote.unwrap();
        assert_eq!(remote_side.title, "remote title");
        assert_eq!(remote_side.version, VersionToken::new("v2"));
    }

    #[test]
    fn test_notice_without_remote_revision() {
        let record = make_update_record();
        let notice = ConflictNotice::from_record(&record, None).unwrap();
        assert!(notice.remote.is_none());
    }

    #[test]
    fn test_notice_rejects_non_updates() {
        let record = MutationRecord::new(MutationPayload::Create {
            temp_id: TempId::generate(),
            fields: EntryFields::new("A", "a"),
            attachments: Vec::new(),
        });
        assert!(ConflictNotice::from_record(&record, None).is_none());
    }

    #[test]
    fn test_stats_stay_balanced() {
        let mut stats = ConflictStats::default();
        assert!(stats.is_balanced());

        stats.record(ConflictOutcome::AutoResolved);
        stats.record(ConflictOutcome::AutoResolved);
        stats.record(ConflictOutcome::UserPrompted);
        stats.record(ConflictOutcome::FetchFailedDiscarded);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.auto_resolved, 2);
        assert_eq!(stats.user_prompted, 1);
        assert_eq!(stats.fetch_failed_discards, 1);
        assert!(stats.is_balanced());
    }
}
