//! Durable, ordered storage for mutation records.
//!
//! The store holds the queue in memory and mirrors every change to a JSON
//! file before returning, so a crash after `append` cannot lose the record
//! and a crash after `remove` cannot resurrect it. Writes go through a
//! temp-file-and-rename so a crash mid-write leaves the previous file intact.
//!
//! A single-writer discipline is assumed: all mutating calls take `&mut self`
//! and the engine is the only component that removes or retries records.

use crate::error::QueueError;
use crate::mutation::{MutationId, MutationPayload, MutationRecord};
use chrono::Utc;
use entry_model::VersionToken;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent FIFO queue of mutation records.
pub struct QueueStore {
    /// Backing file for the queue.
    path: PathBuf,
    /// Records in enqueue order.
    records: Vec<MutationRecord>,
}

impl QueueStore {
    /// Open the store at the given path, loading any persisted queue.
    ///
    /// A missing file is an empty queue, not an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let records = if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str(&json)?
        } else {
            Vec::new()
        };

        Ok(Self { path, records })
    }

    /// Append a mutation, assigning identity and timestamp.
    ///
    /// The record is durable before this returns.
    pub fn append(&mut self, payload: MutationPayload) -> Result<MutationRecord, QueueError> {
        let record = MutationRecord::new(payload);
        self.records.push(record.clone());
        self.persist()?;

        tracing::debug!(id = %record.id, kind = %record.kind(), "mutation queued");
        Ok(record)
    }

    /// Re-insert a previously surfaced record at the back of the queue.
    ///
    /// Used when the user decides to keep their local change after a conflict.
    pub fn append_record(&mut self, mut record: MutationRecord) -> Result<MutationRecord, QueueError> {
        record.created_at = Utc::now();
        self.records.push(record.clone());
        self.persist()?;
        Ok(record)
    }

    /// Snapshot of the queue in FIFO order.
    pub fn list(&self) -> Vec<MutationRecord> {
        self.records.clone()
    }

    /// Remove a record. Removing an already-removed record is a no-op.
    ///
    /// Returns whether a record was actually removed. The removal is durable
    /// before this returns.
    pub fn remove(&mut self, id: MutationId) -> Result<bool, QueueError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);

        if self.records.len() == before {
            return Ok(false);
        }

        self.persist()?;
        tracing::debug!(id = %id, "mutation removed from queue");
        Ok(true)
    }

    /// Increment the retry counter of a record.
    ///
    /// Returns the new count, or `None` if the record is no longer queued.
    pub fn increment_retry(&mut self, id: MutationId) -> Result<Option<u32>, QueueError> {
        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };

        record.retry_count += 1;
        let count = record.retry_count;
        self.persist()?;
        Ok(Some(count))
    }

    /// Refresh the version token of a queued update and move it to the back
    /// of the queue, so it is retried on the next run rather than the current
    /// one. Bumps the record's conflict counter.
    ///
    /// Returns `false` if the record is gone or is not an update.
    pub fn requeue_with_version(
        &mut self,
        id: MutationId,
        version: VersionToken,
    ) -> Result<bool, QueueError> {
        let Some(index) = self.records.iter().position(|record| record.id == id) else {
            return Ok(false);
        };

        let MutationPayload::Update { version: queued, .. } = &mut self.records[index].payload
        else {
            return Ok(false);
        };
        *queued = version;

        let mut record = self.records.remove(index);
        record.conflict_retries += 1;
        record.created_at = Utc::now();
        self.records.push(record);

        self.persist()?;
        Ok(true)
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rewrite the backing file atomically.
    fn persist(&self) -> Result<(), QueueError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
