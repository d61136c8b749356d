//! Remote mutation client contract and collaborators.
//!
//! The queue depends only on this contract, not on transport details.
//! Authentication lives behind the trait: implementations attach a bearer
//! credential to every call and refresh it transparently; only an
//! unrecoverable auth failure surfaces, as `RemoteError::AuthExpired`.
//!
//! `MemoryRemote` is a versioned in-memory implementation for tests and
//! local development.

use entry_model::{AttachmentRef, EntryChanges, EntryFields, EntryId, JournalEntry, VersionToken};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failures reported by the remote mutation client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport failure: network drop, timeout, or server-side outage.
    /// Retryable; the record stays queued.
    #[error("network unavailable: {0}")]
    Network(String),

    /// The entry's version token no longer matches the server's.
    /// Routed to the conflict resolver for updates.
    #[error("version conflict")]
    Conflict,

    /// The server rejected the mutation as invalid. Not retryable.
    #[error("rejected by server: {reason}")]
    Validation { reason: String },

    /// The target entry does not exist on the server.
    #[error("entry not found: {0}")]
    NotFound(u64),

    /// The bearer credential expired and could not be refreshed.
    /// Escalates out of the queue; records stay queued pending re-login.
    #[error("authentication expired")]
    AuthExpired,
}

impl RemoteError {
    /// Whether a retry on a later run can plausibly succeed unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }
}

/// Server response to a successful create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateResponse {
    /// The server-assigned entry identifier.
    pub real_id: u64,
    /// The initial version token of the stored entry.
    pub version: VersionToken,
}

/// The remote store's mutation and fetch surface.
#[trait_variant::make(Send)]
pub trait RemoteMutationClient: Send + Sync {
    /// Create an entry, uploading the given attachments alongside the fields.
    async fn create_entry(
        &self,
        fields: EntryFields,
        attachments: Vec<AttachmentRef>,
    ) -> Result<CreateResponse, RemoteError>;

    /// Apply a partial change set to an entry.
    ///
    /// `version` is the token last observed by the client; a mismatch with the
    /// server's current token yields `RemoteError::Conflict`.
    async fn update_entry(
        &self,
        id: u64,
        changes: EntryChanges,
        version: VersionToken,
    ) -> Result<VersionToken, RemoteError>;

    /// Delete an entry.
    async fn delete_entry(&self, id: u64) -> Result<(), RemoteError>;

    /// Fetch the authoritative state of one entry.
    async fn fetch_entry(&self, id: u64) -> Result<JournalEntry, RemoteError>;

    /// Fetch the full entry collection.
    async fn fetch_entries(&self) -> Result<Vec<JournalEntry>, RemoteError>;
}

/// Answers whether the bytes behind a local attachment reference still exist.
pub trait AttachmentStore: Send + Sync {
    fn exists(&self, attachment: &AttachmentRef) -> bool;
}

/// Filesystem-backed attachment existence check.
#[derive(Debug, Default)]
pub struct FsAttachmentStore;

impl AttachmentStore for FsAttachmentStore {
    fn exists(&self, attachment: &AttachmentRef) -> bool {
        match attachment.local_path() {
            Some(path) => Path::new(path).exists(),
            // Already uploaded; nothing to check locally.
            None => true,
        }
    }
}

/// An entry as held by the in-memory remote.
#[derive(Clone, Debug)]
struct StoredEntry {
    entry: JournalEntry,
    version_seq: u64,
}

impl StoredEntry {
    fn token(seq: u64) -> VersionToken {
        VersionToken::new(format!("v{}", seq))
    }
}

#[derive(Default)]
struct MemoryRemoteInner {
    entries: BTreeMap<u64, StoredEntry>,
    next_id: u64,
    offline: bool,
    scripted_failures: VecDeque<RemoteError>,
}

/// Versioned in-memory implementation of `RemoteMutationClient`.
///
/// Assigns sequential real ids, bumps the version token on every update, and
/// reports a conflict when a stale token is presented. Cloning shares the
/// underlying store, so tests can keep a handle for inspection while the
/// engine owns another.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<MemoryRemoteInner>>,
}

impl MemoryRemote {
    /// Create an empty remote store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate connectivity loss (`true`) or restoration (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Script a failure for the next mutating or fetching call.
    pub fn fail_next(&self, error: RemoteError) {
        self.lock().scripted_failures.push_back(error);
    }

    /// Store an entry directly, bypassing the client contract.
    pub fn seed(&self, fields: EntryFields) -> (u64, VersionToken) {
        let mut inner = self.lock();
        let id = Self::allocate_id(&mut inner);
        let version = StoredEntry::token(1);
        let entry = JournalEntry::new(id, fields, version.clone());
        inner.entries.insert(id, StoredEntry { entry, version_seq: 1 });
        (id, version)
    }

    /// Apply an out-of-band edit, as another device would, bumping the
    /// version token.
    pub fn edit_behind_client(&self, id: u64, changes: &EntryChanges) -> Option<VersionToken> {
        let mut inner = self.lock();
        let stored = inner.entries.get_mut(&id)?;
        stored.entry.fields.apply(changes);
        stored.version_seq += 1;
        stored.entry.version = StoredEntry::token(stored.version_seq);
        stored.entry.updated_at = chrono::Utc::now();
        Some(stored.entry.version.clone())
    }

    /// Current state of one entry.
    pub fn entry(&self, id: u64) -> Option<JournalEntry> {
        self.lock().entries.get(&id).map(|stored| stored.entry.clone())
    }

    /// All entries, ordered by id.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().entries.values().map(|stored| stored.entry.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryRemoteInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn allocate_id(inner: &mut MemoryRemoteInner) -> u64 {
        inner.next_id += 1;
        inner.next_id
    }

    fn gate(inner: &mut MemoryRemoteInner) -> Result<(), RemoteError> {
        if let Some(error) = inner.scripted_failures.pop_front() {
            return Err(error);
        }
        if inner.offline {
            return Err(RemoteError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

impl RemoteMutationClient for MemoryRemote {
    async fn create_entry(
        &self,
        fields: EntryFields,
        attachments: Vec<AttachmentRef>,
    ) -> Result<CreateResponse, RemoteError> {
        let mut inner = self.lock();
        Self::gate(&mut inner)?;

        let id = Self::allocate_id(&mut inner);
        let version = StoredEntry::token(1);
        let entry =
            JournalEntry::new(id, fields, version.clone()).with_attachments(attachments);
        inner.entries.insert(id, StoredEntry { entry, version_seq: 1 });

        Ok(CreateResponse { real_id: id, version })
    }

    async fn update_entry(
        &self,
        id: u64,
        changes: EntryChanges,
        version: VersionToken,
    ) -> Result<VersionToken, RemoteError> {
        let mut inner = self.lock();
        Self::gate(&mut inner)?;

        let stored = inner.entries.get_mut(&id).ok_or(RemoteError::NotFound(id))?;
        // An initial token means the client never saw a server version for
        // this entry (it was queued behind the create); write unconditionally.
        if !version.is_initial() && stored.entry.version != version {
            return Err(RemoteError::Conflict);
        }

        stored.entry.fields.apply(&changes);
        stored.version_seq += 1;
        stored.entry.version = StoredEntry::token(stored.version_seq);
        stored.entry.updated_at = chrono::Utc::now();
        Ok(stored.entry.version.clone())
    }

    async fn delete_entry(&self, id: u64) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        Self::gate(&mut inner)?;

        inner.entries.remove(&id).ok_or(RemoteError::NotFound(id))?;
        Ok(())
    }

    async fn fetch_entry(&self, id: u64) -> Result<JournalEntry, RemoteError> {
        let mut inner = self.lock();
        Self::gate(&mut inner)?;

        inner
            .entries
            .get(&id)
            .map(|stored| stored.entry.clone())
            .ok_or(RemoteError::NotFound(id))
    }

    async fn fetch_entries(&self) -> Result<Vec<JournalEntry>, RemoteError> {
        let mut inner = self.lock();
        Self::gate(&mut inner)?;

        Ok(inner.entries.values().map(|stored| stored.entry.clone()).collect())
    }
}
