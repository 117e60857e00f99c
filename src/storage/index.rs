//! CPC Prefix Index
//!
//! Two maps over valid records:
//! - `by_prefix`: section / class / subclass prefix -> patent ids
//! - `by_code`: full canonical code -> patent ids (also the distinct code set)
//!
//! A literal prefix that is an index key is answered directly. Anything else
//! (longer prefixes, regex patterns) scans `by_code`, which is small compared
//! to the number of records.

use crate::cpc::cpc_prefixes;
use crate::query::filter::CpcFilter;

use dashmap::DashMap;
use std::collections::{BTreeSet, HashSet};

#[derive(Default)]
pub struct CpcIndex {
    by_prefix: DashMap<String, HashSet<String>>,
    by_code: DashMap<String, HashSet<String>>,
}

impl CpcIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, patent_id: &str, codes: &BTreeSet<String>) {
        for code in codes {
            self.by_code
                .entry(code.clone())
                .or_default()
                .insert(patent_id.to_string());

            for prefix in cpc_prefixes(code) {
                self.by_prefix
                    .entry(prefix.to_string())
                    .or_default()
                    .insert(patent_id.to_string());
            }
        }
    }

    /// Patent ids carrying at least one code accepted by `filter`.
    /// `CpcFilter::All` is answered by the caller and yields nothing here.
    pub fn lookup(&self, filter: &CpcFilter) -> HashSet<String> {
        if let CpcFilter::Prefix(prefix) = filter
            && let Some(ids) = self.by_prefix.get(prefix)
        {
            tracing::trace!("CPC prefix '{}' answered from index", prefix);
            return ids.value().clone();
        }
        if matches!(filter, CpcFilter::All) {
            return HashSet::new();
        }

        let mut ids = HashSet::new();
        for entry in self.by_code.iter() {
            if filter.matches_code(entry.key()) {
                ids.extend(entry.value().iter().cloned());
            }
        }
        ids
    }

    pub fn distinct_code_count(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_indexed_prefix(&self, prefix: &str) -> bool {
        self.by_prefix.contains_key(prefix)
    }
}
