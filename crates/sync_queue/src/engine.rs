//! The sync engine: replays queued mutations against the remote store.
//!
//! One run drains the snapshot of the queue taken at run start, one record
//! at a time, in enqueue order. Each record resolves completely before the
//! next starts, because later records may reference temporary identifiers
//! created by earlier ones in the same run. Mutations enqueued during a run
//! wait for the next run.
//!
//! Per-record state machine:
//!
//! ```text
//! Pending -> InFlight -> { Succeeded, Conflicted, RetryScheduled, Discarded }
//! ```
//!
//! Failures of one record never abort the run for subsequent records. The
//! one exception is an expired credential, which every remaining call would
//! hit as well: the run stops and the untouched records stay queued pending
//! re-login.

use crate::conflict::{ConflictDecision, ConflictNotice, ConflictOutcome, ConflictStats};
use crate::error::SyncResult;
use crate::id_map::IdMap;
use crate::mutation::{MutationPayload, MutationRecord};
use crate::notify::{NotificationIntent, NotificationSink};
use crate::queue_store::QueueStore;
use crate::remote::{AttachmentStore, RemoteError, RemoteMutationClient};

/// Engine tunables.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Failed attempts a record may accumulate before it is discarded and
    /// the user notified.
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// Result of a sync trigger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// A run executed; see the report.
    Completed(SyncReport),
    /// A run was already active; the trigger was a no-op.
    AlreadyRunning,
}

/// Summary of one sync run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records confirmed by the server and removed from the queue.
    pub succeeded: usize,
    /// Records that did not succeed this run (retrying, conflicted, or
    /// discarded).
    pub failed: usize,
    /// Records dropped for unrecoverable reasons.
    pub discarded: usize,
    /// Conflict accounting for this run.
    pub conflicts: ConflictStats,
    /// Whether the run stopped early on an expired credential.
    pub interrupted_by_auth: bool,
}

impl SyncReport {
    /// Records that reached a terminal or retry decision this run.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Terminal state of one record within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Processed {
    Succeeded,
    Conflicted(ConflictOutcome),
    RetryScheduled,
    Discarded,
    /// Credential expired; the record was left untouched.
    AuthInterrupted,
}

/// Drains the mutation queue against a remote store.
///
/// Owns the durable queue, the single-flight flag, and the collaborator
/// handles. Constructed once per app instance and passed by reference; there
/// is no hidden global queue.
pub struct SyncEngine<C, A, N> {
    store: QueueStore,
    client: C,
    attachments: A,
    notifier: N,
    config: EngineConfig,
    /// Single-flight flag: at most one run active at a time.
    syncing: bool,
    /// Conflict accounting across the engine's lifetime.
    conflict_stats: ConflictStats,
}

impl<C, A, N> SyncEngine<C, A, N>
where
    C: RemoteMutationClient,
    A: AttachmentStore,
    N: NotificationSink,
{
    /// Create an engine with default tunables.
    pub fn new(store: QueueStore, client: C, attachments: A, notifier: N) -> Self {
        Self::with_config(store, client, attachments, notifier, EngineConfig::default())
    }

    /// Create an engine with explicit tunables.
    pub fn with_config(
        store: QueueStore,
        client: C,
        attachments: A,
        notifier: N,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            client,
            attachments,
            notifier,
            config,
            syncing: false,
            conflict_stats: ConflictStats::default(),
        }
    }

    /// Queue a mutation for replay and acknowledge it to the user.
    pub fn enqueue(&mut self, payload: MutationPayload) -> SyncResult<MutationRecord> {
        let kind = payload.kind();
        let title = payload.title().map(str::to_string);
        let record = self.store.append(payload)?;

        self.notifier.notify(NotificationIntent::QueuedWhileOffline { kind, title });
        Ok(record)
    }

    /// Snapshot of the still-pending queue, for the optimistic view.
    pub fn pending(&self) -> Vec<MutationRecord> {
        self.store.list()
    }

    /// Number of still-pending records.
    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// Whether a run is currently active.
    pub fn is_syncing(&self) -> bool {
        self.syncing
    }

    /// Conflict accounting across all runs so far.
    pub fn conflict_stats(&self) -> ConflictStats {
        self.conflict_stats
    }

    /// The remote client, for collection refetches by the caller.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Execute one sync run, unless one is already active.
    pub async fn run_sync(&mut self) -> SyncResult<RunOutcome> {
        if self.syncing {
            tracing::debug!("sync trigger ignored, run already active");
            return Ok(RunOutcome::AlreadyRunning);
        }

        self.syncing = true;
        let result = self.drain().await;
        self.syncing = false;

        result.map(RunOutcome::Completed)
    }

    async fn drain(&mut self) -> SyncResult<SyncReport> {
        // Snapshot at run start; records enqueued mid-run wait for the next
        // run so they cannot reorder around the ones already in flight.
        let snapshot = self.store.list();
        let mut report = SyncReport::default();
        if snapshot.is_empty() {
            return Ok(report);
        }

        tracing::info!(records = snapshot.len(), "sync run started");
        let mut id_map = IdMap::new();

        for record in &snapshot {
            match self.process(record, &mut id_map).await? {
                Processed::Succeeded => report.succeeded += 1,
                Processed::RetryScheduled => report.failed += 1,
                Processed::Discarded => {
                    report.failed += 1;
                    report.discarded += 1;
                }
                Processed::Conflicted(outcome) => {
                    report.failed += 1;
                    report.conflicts.record(outcome);
                    self.conflict_stats.record(outcome);
                }
                Processed::AuthInterrupted => {
                    report.interrupted_by_auth = true;
                    tracing::warn!("credential expired, abandoning remainder of sync run");
                    self.notifier.notify(NotificationIntent::ReloginRequired);
                    break;
                }
            }
        }

        if report.processed() > 0 {
            self.notifier.notify(NotificationIntent::SyncCompleted {
                succeeded: report.succeeded,
                failed: report.failed,
            });
        }
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "sync run finished"
        );
        Ok(report)
    }

    async fn process(
        &mut self,
        record: &MutationRecord,
        id_map: &mut IdMap,
    ) -> SyncResult<Processed> {
        tracing::debug!(id = %record.id, kind = %record.kind(), "dispatching mutation");

        match &record.payload {
            MutationPayload::Create { temp_id, fields, attachments } => {
                // Missing attachments are dropped rather than failing the
                // record: prefer saving partial content over losing the
                // entry entirely.
                let available: Vec<_> = attachments
                    .iter()
                    .filter(|attachment| self.attachments.exists(attachment))
                    .cloned()
                    .collect();
                let dropped = attachments.len() - available.len();
                if dropped > 0 {
                    tracing::warn!(
                        id = %record.id,
                        dropped,
                        "attachments no longer on disk, uploading without them"
                    );
                }

                match self.client.create_entry(fields.clone(), available).await {
                    Ok(response) => {
                        id_map.record(*temp_id, response.real_id);
                        self.store.remove(record.id)?;
                        Ok(Processed::Succeeded)
                    }
                    Err(error) => self.handle_failure(record, error),
                }
            }
            MutationPayload::Update { id, changes, version } => {
                match id_map.resolve(*id).as_real() {
                    Some(real_id) => {
                        let attempt = self
                            .client
                            .update_entry(real_id, changes.clone(), version.clone())
                            .await;
                        match attempt {
                            Ok(_) => {
                                self.store.remove(record.id)?;
                                Ok(Processed::Succeeded)
                            }
                            Err(RemoteError::Conflict) => {
                                let outcome =
                                    self.resolve_update_conflict(record, real_id).await?;
                                Ok(Processed::Conflicted(outcome))
                            }
                            Err(error) => self.handle_failure(record, error),
                        }
                    }
                    None => {
                        // The create this update targets has not reached the
                        // server yet; keep the record for a later run.
                        tracing::debug!(
                            id = %record.id,
                            "update targets an unacknowledged entry, retrying later"
                        );
                        self.schedule_retry(record)
                    }
                }
            }
            MutationPayload::Delete { id } => match id_map.resolve(*id).as_real() {
                Some(real_id) => match self.client.delete_entry(real_id).await {
                    Ok(()) => {
                        self.store.remove(record.id)?;
                        Ok(Processed::Succeeded)
                    }
                    Err(RemoteError::NotFound(_)) => {
                        // Already gone; the intent is satisfied.
                        self.store.remove(record.id)?;
                        Ok(Processed::Succeeded)
                    }
                    Err(error) => self.handle_failure(record, error),
                },
                None => {
                    tracing::debug!(
                        id = %record.id,
                        "delete targets an unacknowledged entry, retrying later"
                    );
                    self.schedule_retry(record)
                }
            },
        }
    }

    fn handle_failure(
        &mut self,
        record: &MutationRecord,
        error: RemoteError,
    ) -> SyncResult<Processed> {
        match error {
            RemoteError::Network(reason) => {
                tracing::debug!(id = %record.id, %reason, "mutation failed, will retry");
                self.schedule_retry(record)
            }
            RemoteError::Validation { reason } => self.discard(record, reason),
            RemoteError::NotFound(id) => self.discard(record, format!("entry {} not found", id)),
            // A conflict outside the update path is a server-side rejection
            // the client cannot reconcile.
            RemoteError::Conflict => self.discard(record, "version conflict".to_string()),
            RemoteError::AuthExpired => Ok(Processed::AuthInterrupted),
        }
    }

    fn schedule_retry(&mut self, record: &MutationRecord) -> SyncResult<Processed> {
        match self.store.increment_retry(record.id)? {
            Some(count) if count > self.config.max_retries => {
                tracing::warn!(id = %record.id, count, "retry limit exceeded, discarding mutation");
                self.discard(record, "retry limit reached".to_string())
            }
            _ => Ok(Processed::RetryScheduled),
        }
    }

    fn discard(&mut self, record: &MutationRecord, reason: String) -> SyncResult<Processed> {
        self.store.remove(record.id)?;
        self.notifier.notify(NotificationIntent::MutationDiscarded {
            kind: record.kind(),
            title: record.payload.title().map(str::to_string),
            reason,
        });
        Ok(Processed::Discarded)
    }

    /// Settle a version conflict on an update.
    ///
    /// First conflict: refresh the version token from the authoritative
    /// record and requeue at the back, to be retried on the next run rather
    /// than this one. Repeated conflict, or a failed fetch: pull the record
    /// and surface a decision to the user. Never a blind overwrite of either
    /// side.
    async fn resolve_update_conflict(
        &mut self,
        record: &MutationRecord,
        real_id: u64,
    ) -> SyncResult<ConflictOutcome> {
        match self.client.fetch_entry(real_id).await {
            Ok(remote) if record.conflict_retries == 0 => {
                self.store.requeue_with_version(record.id, remote.version.clone())?;
                tracing::info!(
                    id = %record.id,
                    "conflict auto-resolved, requeued with refreshed version"
                );
                Ok(ConflictOutcome::AutoResolved)
            }
            Ok(remote) => {
                // A refreshed token already lost once; stop refreshing and ask.
                self.store.remove(record.id)?;
                if let Some(notice) = ConflictNotice::from_record(record, Some(&remote)) {
                    self.notifier
                        .notify(NotificationIntent::ConflictDecisionNeeded(notice));
                }
                Ok(ConflictOutcome::UserPrompted)
            }
            Err(error) => {
                tracing::warn!(id = %record.id, %error, "conflict fetch failed, surfacing local copy");
                self.store.remove(record.id)?;
                if let Some(notice) = ConflictNotice::from_record(record, None) {
                    self.notifier
                        .notify(NotificationIntent::ConflictDecisionNeeded(notice));
                }
                Ok(ConflictOutcome::FetchFailedDiscarded)
            }
        }
    }

    /// Apply the user's answer to a surfaced conflict.
    ///
    /// `KeepLocal` re-queues the update carrying the remote's version token;
    /// `UseRemote` and `Cancel` drop the local change at the user's request.
    pub fn apply_conflict_decision(
        &mut self,
        notice: &ConflictNotice,
        decision: ConflictDecision,
    ) -> SyncResult<Option<MutationRecord>> {
        match decision {
            ConflictDecision::KeepLocal => {
                let version = notice
                    .remote
                    .as_ref()
                    .map(|remote| remote.version.clone())
                    .unwrap_or_else(|| notice.last_seen_version.clone());

                let record = self.store.append(MutationPayload::Update {
                    id: notice.entry_id,
                    changes: notice.changes.clone(),
                    version,
                })?;
                Ok(Some(record))
            }
            ConflictDecision::UseRemote | ConflictDecision::Cancel => Ok(None),
        }
    }
}
