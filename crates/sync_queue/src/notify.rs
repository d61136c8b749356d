//! User notification intents.
//!
//! The queue emits structured intents; the UI layer decides presentation.
//! While offline, a mutating action is acknowledged immediately rather than
//! blocked; on reconnect the user sees either a run summary or an actionable
//! conflict prompt. A mutation never vanishes without explanation.

use crate::conflict::ConflictNotice;
use crate::mutation::MutationKind;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A notification the UI layer should surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationIntent {
    /// A mutation was queued for later replay ("saved, will sync later").
    QueuedWhileOffline {
        kind: MutationKind,
        title: Option<String>,
    },
    /// A sync run finished and processed at least one record.
    SyncCompleted { succeeded: usize, failed: usize },
    /// A conflict needs the user's decision.
    ConflictDecisionNeeded(ConflictNotice),
    /// A mutation was dropped for an unrecoverable reason.
    MutationDiscarded {
        kind: MutationKind,
        title: Option<String>,
        reason: String,
    },
    /// The credential expired and could not be refreshed; queued mutations
    /// wait for re-login.
    ReloginRequired,
}

/// Receives notification intents from the queue.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, intent: NotificationIntent);
}

/// Sink that forwards intents over an unbounded channel.
///
/// The UI layer holds the receiving end. A dropped receiver silently
/// discards intents rather than failing the sync run.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<NotificationIntent>,
}

impl ChannelSink {
    /// Create a sink and the receiver for the UI layer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationIntent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, intent: NotificationIntent) {
        let _ = self.tx.send(intent);
    }
}

/// Sink that collects intents in memory, for tests and headless use.
///
/// Cloning shares the buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    intents: Arc<Mutex<Vec<NotificationIntent>>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything notified so far.
    pub fn snapshot(&self) -> Vec<NotificationIntent> {
        self.lock().clone()
    }

    /// Drain everything notified so far.
    pub fn take(&self) -> Vec<NotificationIntent> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<NotificationIntent>> {
        match self.intents.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, intent: NotificationIntent) {
        self.lock().push(intent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.notify(NotificationIntent::ReloginRequired);
        sink.notify(NotificationIntent::SyncCompleted { succeeded: 2, failed: 1 });

        let intents = sink.snapshot();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0], NotificationIntent::ReloginRequired);
    }

    #[test]
    fn test_memory_sink_take_drains() {
        let sink = MemorySink::new();
        sink.notify(NotificationIntent::ReloginRequired);

        assert_eq!(sink.take().len(), 1);
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn test_memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        clone.notify(NotificationIntent::ReloginRequired);
        assert_eq!(sink.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.notify(NotificationIntent::SyncCompleted { succeeded: 1, failed: 0 });

        let intent = rx.recv().await.unwrap();
        assert_eq!(intent, NotificationIntent::SyncCompleted { succeeded: 1, failed: 0 });
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        // Must not panic or error the caller.
        sink.notify(NotificationIntent::ReloginRequired);
    }
}
