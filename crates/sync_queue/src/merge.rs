//! Optimistic view merging.
//!
//! Overlays still-pending mutations onto the last fetched server collection
//! so the user immediately sees what they did, before the network confirms
//! it. A pure function of its two inputs; the caller recomputes whenever
//! either changes. Once a mutation succeeds and the collection is refetched,
//! the placeholder or override disappears because the real data now shows
//! the same state.

use crate::mutation::{MutationPayload, MutationRecord};
use entry_model::{EntryId, JournalEntry, VersionToken};
use serde::{Deserialize, Serialize};

/// An entry as shown to the user, with its sync marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub entry: JournalEntry,
    /// Whether this entry still has an unconfirmed mutation behind it.
    pub syncing: bool,
}

/// Overlay pending mutations, in queue order, onto the server collection.
///
/// - `Create` prepends a placeholder entry under its temporary id.
/// - `Update` applies the field overrides to the matching entry. Matching is
///   by the id as queued: the display works on the same run's queue, so
///   temp-to-real substitution does not apply here.
/// - `Delete` removes the matching entry.
///
/// With no pending mutations the output is the server collection, unchanged
/// and unmarked.
pub fn merge_pending(
    server: &[JournalEntry],
    pending: &[MutationRecord],
) -> Vec<DisplayEntry> {
    let mut display: Vec<DisplayEntry> = server
        .iter()
        .map(|entry| DisplayEntry { entry: entry.clone(), syncing: false })
        .collect();

    for record in pending {
        match &record.payload {
            MutationPayload::Create { temp_id, fields, attachments } => {
                let mut entry = JournalEntry::new(
                    EntryId::Temp(*temp_id),
                    fields.clone(),
                    VersionToken::initial(),
                )
                .with_attachments(attachments.clone());
                entry.created_at = record.created_at;
                entry.updated_at = record.created_at;

                display.insert(0, DisplayEntry { entry, syncing: true });
            }
            MutationPayload::Update { id, changes, .. } => {
                if let Some(shown) = display.iter_mut().find(|shown| shown.entry.id == *id) {
                    shown.entry.fields.apply(changes);
                    shown.entry.updated_at = record.created_at;
                    shown.syncing = true;
                }
            }
            MutationPayload::Delete { id } => {
                display.retain(|shown| shown.entry.id != *id);
            }
        }
    }

    display
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationRecord;
    use entry_model::{EntryChanges, EntryFields, TempId};
    use proptest::prelude::*;

    fn server_entry(id: u64, title: &str) -> JournalEntry {
        JournalEntry::new(id, EntryFields::new(title, "body"), VersionToken::new("v1"))
    }

    fn pending_create(title: &str) -> (TempId, MutationRecord) {
        let temp_id = TempId::generate();
        let record = MutationRecord::new(MutationPayload::Create {
            temp_id,
            fields: EntryFields::new(title, "queued body"),
            attachments: Vec::new(),
        });
        (temp_id, record)
    }

    fn pending_update(id: EntryId, changes: EntryChanges) -> MutationRecord {
        MutationRecord::new(MutationPayload::Update {
            id,
            changes,
            version: VersionToken::new("v1"),
        })
    }

    // ========== No distortion ==========

    #[test]
    fn test_empty_queue_reproduces_server_collection() {
        let server = vec![server_entry(1, "A"), server_entry(2, "B")];
        let display = merge_pending(&server, &[]);

        assert_eq!(display.len(), 2);
        for (shown, entry) in display.iter().zip(&server) {
            assert_eq!(&shown.entry, entry);
            assert!(!shown.syncing);
        }
    }

    proptest! {
        #[test]
        fn prop_empty_queue_is_identity(titles in proptest::collection::vec(".*", 0..8)) {
            let server: Vec<_> = titles
                .iter()
                .enumerate()
                .map(|(i, title)| server_entry(i as u64 + 1, title))
                .collect();

            let display = merge_pending(&server, &[]);

            prop_assert_eq!(display.len(), server.len());
            for (shown, entry) in display.iter().zip(&server) {
                prop_assert_eq!(&shown.entry, entry);
                prop_assert!(!shown.syncing);
            }
        }
    }

    // ========== Create ==========

    #[test]
    fn test_pending_create_prepends_syncing_placeholder() {
        let server = vec![server_entry(1, "old")];
        let (temp_id, record) = pending_create("fresh");

        let display = merge_pending(&server, &[record.clone()]);

        assert_eq!(display.len(), 2);
        assert_eq!(display[0].entry.id, EntryId::Temp(temp_id));
        assert_eq!(display[0].entry.title(), "fresh");
        assert_eq!(display[0].entry.created_at, record.created_at);
        assert!(display[0].syncing);
        assert!(!display[1].syncing);
    }

    // ========== Update ==========

    #[test]
    fn test_pending_update_overrides_fields_and_marks_syncing() {
        let server = vec![server_entry(1, "old"), server_entry(2, "other")];
        let record = pending_update(EntryId::Real(1), EntryChanges::title("new"));

        let display = merge_pending(&server, &[record]);

        assert_eq!(display[0].entry.title(), "new");
        assert_eq!(display[0].entry.content(), "body");
        assert!(display[0].syncing);
        assert!(!display[1].syncing);
    }

    #[test]
    fn test_update_for_unknown_entry_is_ignored() {
        let server = vec![server_entry(1, "A")];
        let record = pending_update(EntryId::Real(99), EntryChanges::title("X"));

        let display = merge_pending(&server, &[record]);
        assert_eq!(display.len(), 1);
        assert!(!display[0].syncing);
    }

    #[test]
    fn test_update_applies_to_earlier_placeholder_by_temp_id() {
        let (temp_id, create) = pending_create("draft");
        let update = pending_update(EntryId::Temp(temp_id), EntryChanges::title("final"));

        let display = merge_pending(&[], &[create, update]);

        assert_eq!(display.len(), 1);
        assert_eq!(display[0].entry.title(), "final");
        assert!(display[0].syncing);
    }

    // ========== Delete ==========

    #[test]
    fn test_pending_delete_removes_entry() {
        let server = vec![server_entry(1, "A"), server_entry(7, "doomed")];
        let record = MutationRecord::new(MutationPayload::Delete { id: EntryId::Real(7) });

        let display = merge_pending(&server, &[record]);

        assert_eq!(display.len(), 1);
        assert_eq!(display[0].entry.id, EntryId::Real(1));
    }

    #[test]
    fn test_queue_order_applies_update_then_delete() {
        let server = vec![server_entry(1, "A")];
        let update = pending_update(EntryId::Real(1), EntryChanges::title("renamed"));
        let delete = MutationRecord::new(MutationPayload::Delete { id: EntryId::Real(1) });

        let display = merge_pending(&server, &[update, delete]);
        assert!(display.is_empty());
    }
}
