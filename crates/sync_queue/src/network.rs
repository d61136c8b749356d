//! Connectivity tracking.
//!
//! The monitor keeps the current connectivity boolean and turns raw platform
//! observations into edge events: exactly one `CameOnline` per offline→online
//! change and one `WentOffline` per online→offline change, with repeated
//! observations of the same state suppressed. Subscribers get the current
//! boolean over a watch channel.
//!
//! If the platform cannot answer a connectivity query the monitor reports
//! online. Writes must not be blocked indefinitely on an unanswerable probe;
//! the sync engine's retry path absorbs the occasional wrong guess.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A connectivity state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Offline → online. Triggers a sync run.
    CameOnline,
    /// Online → offline. New mutations will be queued.
    WentOffline,
}

/// Answers point-in-time connectivity queries.
///
/// `None` means the platform could not answer.
pub trait ConnectivityProbe {
    fn check(&self) -> Option<bool>;
}

/// Tracks connectivity and emits deduplicated transitions.
pub struct NetworkMonitor {
    /// Current connectivity.
    online: bool,
    /// Broadcast of the current connectivity boolean.
    tx: watch::Sender<bool>,
}

impl NetworkMonitor {
    /// Create a monitor that assumes connectivity until told otherwise.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(true);
        Self { online: true, tx }
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Subscribe to connectivity changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Feed an observation from the platform.
    ///
    /// `None` (the platform could not answer) is treated as online. Returns a
    /// transition only when the observed state differs from the current one.
    pub fn observe(&mut self, reported: Option<bool>) -> Option<Transition> {
        let online = reported.unwrap_or(true);
        if online == self.online {
            return None;
        }

        self.online = online;
        let _ = self.tx.send(online);

        let transition = if online {
            Transition::CameOnline
        } else {
            Transition::WentOffline
        };
        tracing::info!(?transition, "connectivity changed");
        Some(transition)
    }

    /// Query a probe and feed the result through `observe`.
    pub fn poll(&mut self, probe: &impl ConnectivityProbe) -> Option<Transition> {
        self.observe(probe.check())
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
