//! Top-level service tying connectivity to the sync engine.
//!
//! The service owns the engine and the network monitor. Every connectivity
//! observation flows through [`SyncService::handle_connectivity`]; a
//! deduplicated offline→online transition triggers exactly one sync run.
//! Callers can also force a run with [`SyncService::sync_now`], for app
//! foregrounding or a manual refresh gesture.

use crate::engine::{RunOutcome, SyncEngine};
use crate::error::SyncResult;
use crate::merge::{merge_pending, DisplayEntry};
use crate::mutation::{MutationPayload, MutationRecord};
use crate::network::{ConnectivityProbe, NetworkMonitor, Transition};
use crate::notify::NotificationSink;
use crate::remote::{AttachmentStore, RemoteError, RemoteMutationClient};
use tokio::sync::watch;

/// Connectivity-aware front door to the mutation queue.
pub struct SyncService<C, A, N> {
    engine: SyncEngine<C, A, N>,
    monitor: NetworkMonitor,
}

impl<C, A, N> SyncService<C, A, N>
where
    C: RemoteMutationClient,
    A: AttachmentStore,
    N: NotificationSink,
{
    /// Wrap an engine with a fresh monitor, which assumes connectivity
    /// until an observation says otherwise.
    pub fn new(engine: SyncEngine<C, A, N>) -> Self {
        Self { engine, monitor: NetworkMonitor::new() }
    }

    /// Current connectivity as last observed.
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Subscribe to the connectivity boolean, for UI indicators.
    pub fn subscribe_connectivity(&self) -> watch::Receiver<bool> {
        self.monitor.subscribe()
    }

    /// Queue a mutation for replay.
    ///
    /// Always queues, online or not; an immediately-following run drains it
    /// when the network cooperates.
    pub fn enqueue(&mut self, payload: MutationPayload) -> SyncResult<MutationRecord> {
        self.engine.enqueue(payload)
    }

    /// Feed a connectivity observation from the platform.
    ///
    /// On an offline→online transition, triggers a sync run and returns its
    /// outcome. Every other observation returns `None`.
    pub async fn handle_connectivity(
        &mut self,
        reported: Option<bool>,
    ) -> SyncResult<Option<RunOutcome>> {
        match self.monitor.observe(reported) {
            Some(Transition::CameOnline) => {
                let outcome = self.engine.run_sync().await?;
                Ok(Some(outcome))
            }
            Some(Transition::WentOffline) | None => Ok(None),
        }
    }

    /// Query a probe and feed the result through `handle_connectivity`.
    pub async fn poll_connectivity(
        &mut self,
        probe: &impl ConnectivityProbe,
    ) -> SyncResult<Option<RunOutcome>> {
        let reported = probe.check();
        self.handle_connectivity(reported).await
    }

    /// Trigger a sync run regardless of connectivity history.
    pub async fn sync_now(&mut self) -> SyncResult<RunOutcome> {
        self.engine.run_sync().await
    }

    /// Fetch the server collection and overlay the still-pending queue.
    pub async fn display(&self) -> Result<Vec<DisplayEntry>, RemoteError> {
        let server = self.engine.client().fetch_entries().await?;
        Ok(merge_pending(&server, &self.engine.pending()))
    }

    /// Overlay the pending queue onto an already-fetched collection, for
    /// callers that cache the last server snapshot while offline.
    pub fn display_cached(&self, server: &[entry_model::JournalEntry]) -> Vec<DisplayEntry> {
        merge_pending(server, &self.engine.pending())
    }

    /// The engine, for conflict decisions and queue inspection.
    pub fn engine(&self) -> &SyncEngine<C, A, N> {
        &self.engine
    }

    /// Mutable engine access.
    pub fn engine_mut(&mut self) -> &mut SyncEngine<C, A, N> {
        &mut self.engine
    }
}
