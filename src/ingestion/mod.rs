//! Ingestion Service Module
//!
//! Turns bulk patent archives into normalized records in the Patent Store.
//!
//! ## Workflow
//! 1. **Promote**: zips dropped in `staging` move to `raw/patents`.
//! 2. **Unpack**: each archive's XML bulk files are streamed out of the zip.
//! 3. **Split**: a bulk file is cut into single patent documents by a
//!    depth-tracking scan, without parsing the file as a whole.
//! 4. **Normalize**: each document becomes a valid or rejected `PatentRecord`.
//! 5. **Place**: records are upserted and persisted, then the archive moves to
//!    `transformed` (or `archived` for historical batches).
//!
//! Every batch is recorded in the ledger under `transformed/reports`; the
//! archive checksums it holds make re-ingestion a no-op.

pub mod handlers;
pub mod ledger;
pub mod normalizer;
pub mod orchestrator;
pub mod splitter;
pub mod types;
pub mod unpacker;

pub use orchestrator::IngestOrchestrator;
