//! Entry Model - Journal entry types shared by the sync queue and its callers
//!
//! This crate provides the foundational entity types for the journal client:
//! entries, entry identifiers (server-assigned and client-minted temporary),
//! version tokens for optimistic concurrency, and attachment references.

mod attachment;
mod entry;
mod entry_id;
mod fields;
mod version;

pub use attachment::*;
pub use entry::*;
pub use entry_id::*;
pub use fields::*;
pub use version::*;
