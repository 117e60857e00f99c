use super::filter::CpcFilter;
use super::types::{QueryParams, Summary};
use crate::error::Result;
use crate::storage::memory::{
    PatentStore, distinct_assignees, distinct_inventors, distinct_titles,
};

use std::sync::Arc;

/// Read-only queries over the Patent Store.
///
/// Every query is a synchronous scan that copies out the matching records,
/// so it never holds store locks against ingestion for longer than the scan.
pub struct QueryEngine {
    store: Arc<PatentStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<PatentStore>) -> Self {
        Self { store }
    }

    fn filter(params: &QueryParams) -> Result<CpcFilter> {
        CpcFilter::from_params(params.cpc_class.as_deref(), params.regex_enabled())
    }

    pub fn inventors(&self, params: &QueryParams) -> Result<Vec<String>> {
        Ok(self.store.distinct_inventors(&Self::filter(params)?))
    }

    pub fn assignees(&self, params: &QueryParams) -> Result<Vec<String>> {
        Ok(self.store.distinct_assignees(&Self::filter(params)?))
    }

    pub fn titles(&self, params: &QueryParams) -> Result<Vec<String>> {
        Ok(self.store.distinct_titles(&Self::filter(params)?))
    }

    /// All three projections are taken from a single filtering pass.
    pub fn summary(&self, params: &QueryParams) -> Result<Summary> {
        let filter = Self::filter(params)?;
        let records = self.store.all_matching(&filter);
        tracing::debug!("Summary over {} matching records", records.len());

        Ok(Summary {
            inventors: distinct_inventors(&records),
            assignees: distinct_assignees(&records),
            titles: distinct_titles(&records),
        })
    }
}
