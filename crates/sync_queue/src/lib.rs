//! Offline-first mutation queue and reconciliation engine.
//!
//! Journal mutations made while offline (or that simply fail in flight) are
//! captured as durable records and replayed against the remote store when
//! connectivity returns. The crate provides:
//!
//! - `mutation`: the mutation record model (create / update / delete)
//! - `queue_store`: the durable FIFO queue, persisted as JSON
//! - `network`: connectivity tracking with deduplicated transitions
//! - `id_map`: temporary-to-real identifier remapping within a sync run
//! - `remote`: the remote client contract and an in-memory implementation
//! - `engine`: the sync engine that drains the queue, one record at a time
//! - `conflict`: version-conflict resolution and accounting
//! - `merge`: the optimistic overlay of pending mutations onto server data
//! - `notify`: structured notification intents for the UI layer
//! - `service`: the connectivity-aware front door tying it all together
//!
//! # Example
//!
//! ```
//! use entry_model::{EntryFields, TempId};
//! use sync_queue::{merge_pending, MutationPayload, QueueStore};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut store = QueueStore::open(dir.path().join("queue.json")).unwrap();
//!
//! // Saved while offline: queued durably, shown immediately.
//! store
//!     .append(MutationPayload::Create {
//!         temp_id: TempId::generate(),
//!         fields: EntryFields::new("Rainy day", "Stayed in and read."),
//!         attachments: Vec::new(),
//!     })
//!     .unwrap();
//!
//! let display = merge_pending(&[], &store.list());
//! assert_eq!(display[0].entry.title(), "Rainy day");
//! assert!(display[0].syncing);
//! ```

pub mod conflict;
pub mod engine;
pub mod error;
pub mod id_map;
pub mod merge;
pub mod mutation;
pub mod network;
pub mod notify;
pub mod queue_store;
pub mod remote;
pub mod service;

pub use conflict::{
    ConflictDecision, ConflictNotice, ConflictOutcome, ConflictStats, RemoteRevision,
};
pub use engine::{EngineConfig, RunOutcome, SyncEngine, SyncReport};
pub use error::{QueueError, SyncError, SyncResult};
pub use id_map::IdMap;
pub use merge::{merge_pending, DisplayEntry};
pub use mutation::{MutationId, MutationKind, MutationPayload, MutationRecord};
pub use network::{ConnectivityProbe, NetworkMonitor, Transition};
pub use notify::{ChannelSink, MemorySink, NotificationIntent, NotificationSink};
pub use queue_store::QueueStore;
pub use remote::{
    AttachmentStore, CreateResponse, FsAttachmentStore, MemoryRemote, RemoteError,
    RemoteMutationClient,
};
pub use service::SyncService;
