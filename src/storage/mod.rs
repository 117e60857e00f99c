//! Patent Store Module
//!
//! Durable, row-oriented storage of normalized patent records.
//!
//! ## Core Concepts
//! - **Rows**: valid records keyed by `patent_id`; the key is unique among valid records.
//! - **Audit logs**: duplicates (lost an id collision) and rejected documents, keyed by provenance.
//! - **CPC index**: section / class / subclass prefixes and full codes mapped to patent ids.
//! - **Durability**: JSON Lines artifacts in the `transformed` and `prepared` zones,
//!   restored on start-up.

pub mod handlers;
pub mod index;
pub mod memory;
pub mod persist;
pub mod types;

pub use memory::{PatentStore, UpsertOutcome};
pub use types::{ByteRange, PatentRecord, RecordStatus, Rejection};

#[cfg(test)]
mod tests;
