//! Query Service Module
//!
//! Answers distinct-value queries over the Patent Store, optionally filtered
//! by CPC classification.
//!
//! ## Overview
//! - `cpc_class` absent: the whole corpus.
//! - `use_regex=false`: `cpc_class` is a case-sensitive literal prefix of a code.
//! - `use_regex=true`: `cpc_class` is a regex searched anywhere in a code.
//!
//! A record matches when any of its codes matches. The filter is a single
//! `CpcFilter` value; the summary query projects inventors, assignees and
//! titles from one filtered record set.
//!
//! ## Submodules
//! - **`filter`**: the shared CPC predicate.
//! - **`engine`**: query execution and projections.
//! - **`handlers`**: Axum handlers for `/api/inventors`, `/api/assignees`, `/api/titles`, `/api/summary`.
//! - **`types`**: request parameters and response bodies.

pub mod engine;
pub mod filter;
pub mod handlers;
pub mod types;

pub use engine::QueryEngine;
pub use filter::CpcFilter;

#[cfg(test)]
mod tests;
