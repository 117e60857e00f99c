//! Patent Data Lake Library
//!
//! Ingests USPTO bulk patent archives into a staged data lake and answers
//! CPC-filtered queries over the normalized records. The binary (`main.rs`)
//! wires these modules into a CLI and an HTTP API.
//!
//! ## Architecture Modules
//! - **`zones`**: the staged directories (`staging` to `archived`) behind one trait.
//! - **`ingestion`**: unpacking, splitting and normalizing archives, batch tracking.
//! - **`storage`**: the Patent Store, its CPC index and its durable artifacts.
//! - **`query`**: the shared CPC filter and the distinct-value queries.
//! - **`cpc`**: canonical classification codes.
//! - **`config`**, **`error`**: runtime configuration and the error taxonomy.

pub mod config;
pub mod cpc;
pub mod error;
pub mod ingestion;
pub mod query;
pub mod storage;
pub mod zones;
