//! Zone Store Module
//!
//! The data lake is a set of staged directories (`staging`, `raw`, `prepared`,
//! `transformed`, `archived`). The pipeline only ever talks to them through the
//! `ZoneStore` trait, so the same code runs against real directories or an
//! in-memory double.
//!
//! ## Submodules
//! - **`types`**: `Zone` and `FileRef`, including the one-directional move rule.
//! - **`store`**: the `ZoneStore` trait.
//! - **`fs`**: directory-backed implementation with atomic writes.
//! - **`memory`**: in-memory implementation used by tests.

pub mod fs;
pub mod memory;
pub mod store;
pub mod types;

pub use fs::FsZoneStore;
pub use memory::MemoryZoneStore;
pub use store::{ReadSeek, ZoneStore};
pub use types::{FileRef, Zone};

#[cfg(test)]
mod tests;
