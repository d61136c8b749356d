//! Temporary-to-real identifier mapping.
//!
//! Scoped to a single sync run: a fresh map is built when a run starts and
//! dropped when it ends. It is populated only by successful creates, and
//! consulted before dispatching updates and deletes whose target was minted
//! earlier in the same run. Never persisted: once a create has been removed
//! from the durable queue, any record that still names its temporary id was
//! enqueued before the create's success was known and is sitting behind it
//! in the same snapshot.

use entry_model::{EntryId, TempId};
use std::collections::HashMap;

/// Table of temporary ids to server-assigned ids for one sync run.
#[derive(Debug, Default)]
pub struct IdMap {
    map: HashMap<TempId, u64>,
}

impl IdMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a server-assigned id for a temporary id.
    pub fn record(&mut self, temp: TempId, real: u64) {
        self.map.insert(temp, real);
    }

    /// Look up the real id for a temporary id.
    pub fn get(&self, temp: TempId) -> Option<u64> {
        self.map.get(&temp).copied()
    }

    /// Substitute a known temporary id with its real id.
    ///
    /// Real ids and unknown temporary ids pass through unchanged.
    pub fn resolve(&self, id: EntryId) -> EntryId {
        match id {
            EntryId::Temp(temp) => match self.get(temp) {
                Some(real) => EntryId::Real(real),
                None => id,
            },
            EntryId::Real(_) => id,
        }
    }

    /// Number of recorded mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check whether any mapping has been recorded.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
