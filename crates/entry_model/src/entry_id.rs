//! Entry identifiers.
//!
//! An entry is addressed either by the server-assigned numeric identifier or,
//! before the server has acknowledged its creation, by a client-minted
//! temporary identifier. Keeping the two apart as a sum type lets the sync
//! engine dispatch exhaustively instead of sniffing id shapes.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A client-minted placeholder identifier for an entry the server has not
/// acknowledged yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TempId(Uuid);

impl TempId {
    /// Generate a new unique temporary identifier.
    pub fn generate() -> Self {
        TempId(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

/// Identifier for a journal entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryId {
    /// Server-assigned identifier.
    Real(u64),
    /// Client-minted identifier awaiting server acknowledgment.
    Temp(TempId),
}

impl EntryId {
    /// Check whether this is a temporary identifier.
    pub fn is_temp(&self) -> bool {
        matches!(self, EntryId::Temp(_))
    }

    /// Check whether this is a server-assigned identifier.
    pub fn is_real(&self) -> bool {
        matches!(self, EntryId::Real(_))
    }

    /// Get the server-assigned identifier, if any.
    pub fn as_real(&self) -> Option<u64> {
        match self {
            EntryId::Real(id) => Some(*id),
            EntryId::Temp(_) => None,
        }
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        EntryId::Real(id)
    }
}

impl From<TempId> for EntryId {
    fn from(id: TempId) -> Self {
        EntryId::Temp(id)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Real(id) => write!(f, "{}", id),
            EntryId::Temp(id) => write!(f, "{}", id),
        }
    }
}
