use super::index::CpcIndex;
use super::types::{PatentRecord, ProvenanceKey, RecordStatus, StoreStats};
use crate::error::{LakeError, Result};
use crate::query::filter::CpcFilter;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of a successful `upsert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// The identical record (provenance included) was already stored.
    Unchanged,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    seq: u64,
    record: PatentRecord,
}

/// Row store of patent records keyed by `patent_id`.
///
/// Valid records live in `records`; duplicates and rejected records are
/// audit logs keyed by provenance. Every entry carries an insertion sequence
/// so scans return records in first-seen order.
pub struct PatentStore {
    records: DashMap<String, StoredRecord>,
    duplicates: DashMap<ProvenanceKey, StoredRecord>,
    rejected: DashMap<ProvenanceKey, StoredRecord>,
    index: CpcIndex,
    next_seq: AtomicU64,
}

impl Default for PatentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatentStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            duplicates: DashMap::new(),
            rejected: DashMap::new(),
            index: CpcIndex::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserts a valid record.
    ///
    /// The uniqueness check and the insert happen under the same shard lock,
    /// so concurrent callers can never store two valid records for one id.
    /// A different record under an existing id fails with `Conflict` and is
    /// not written.
    pub fn upsert(&self, record: PatentRecord) -> Result<UpsertOutcome> {
        match self.records.entry(record.patent_id.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().record == record {
                    Ok(UpsertOutcome::Unchanged)
                } else {
                    Err(LakeError::Conflict {
                        patent_id: record.patent_id,
                    })
                }
            }
            Entry::Vacant(slot) => {
                self.index.insert(&record.patent_id, &record.cpc_codes);
                let seq = self.next_seq();
                slot.insert(StoredRecord { seq, record });
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Appends a duplicate to the audit log. Returns false if that exact
    /// source location was already logged.
    pub fn record_duplicate(&self, record: PatentRecord) -> bool {
        self.append_log(&self.duplicates, record)
    }

    /// Appends a rejected record to the audit log. Returns false if that
    /// exact source location was already logged.
    pub fn record_rejected(&self, record: PatentRecord) -> bool {
        self.append_log(&self.rejected, record)
    }

    fn append_log(&self, log: &DashMap<ProvenanceKey, StoredRecord>, record: PatentRecord) -> bool {
        match log.entry(record.provenance_key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                let seq = self.next_seq();
                slot.insert(StoredRecord { seq, record });
                true
            }
        }
    }

    pub fn get(&self, patent_id: &str) -> Option<PatentRecord> {
        self.records
            .get(patent_id)
            .map(|entry| entry.value().record.clone())
    }

    /// Valid records with at least one code accepted by `filter`, in
    /// first-seen order. Matching records are copied out so the scan holds
    /// no lock once it returns.
    pub fn all_matching(&self, filter: &CpcFilter) -> Vec<PatentRecord> {
        let mut matched: Vec<StoredRecord> = match filter {
            CpcFilter::All => self
                .records
                .iter()
                .map(|entry| entry.value().clone())
                .collect(),
            _ => self
                .index
                .lookup(filter)
                .iter()
                .filter_map(|id| self.records.get(id).map(|entry| entry.value().clone()))
                .collect(),
        };

        matched.sort_by_key(|stored| stored.seq);
        matched.into_iter().map(|stored| stored.record).collect()
    }

    pub fn distinct_inventors(&self, filter: &CpcFilter) -> Vec<String> {
        distinct_inventors(&self.all_matching(filter))
    }

    pub fn distinct_assignees(&self, filter: &CpcFilter) -> Vec<String> {
        distinct_assignees(&self.all_matching(filter))
    }

    pub fn distinct_titles(&self, filter: &CpcFilter) -> Vec<String> {
        distinct_titles(&self.all_matching(filter))
    }

    pub fn duplicates(&self) -> Vec<PatentRecord> {
        sorted_log(&self.duplicates)
    }

    pub fn rejected(&self) -> Vec<PatentRecord> {
        sorted_log(&self.rejected)
    }

    pub fn valid_count(&self) -> usize {
        self.records.len()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            valid: self.records.len(),
            duplicate: self.duplicates.len(),
            rejected: self.rejected.len(),
            distinct_cpc_codes: self.index.distinct_code_count(),
        }
    }

    /// Routes a restored record by its status.
    pub fn restore(&self, record: PatentRecord) {
        match record.status {
            RecordStatus::Valid => {
                if let Err(err) = self.upsert(record.clone()) {
                    tracing::warn!(
                        "Restored record from {} collides: {}",
                        record.source_archive,
                        err
                    );
                    self.record_duplicate(record.into_duplicate());
                }
            }
            RecordStatus::Duplicate => {
                self.record_duplicate(record);
            }
            RecordStatus::Rejected => {
                self.record_rejected(record);
            }
        }
    }
}

fn sorted_log(log: &DashMap<ProvenanceKey, StoredRecord>) -> Vec<PatentRecord> {
    let mut entries: Vec<StoredRecord> = log.iter().map(|entry| entry.value().clone()).collect();
    entries.sort_by_key(|stored| stored.seq);
    entries.into_iter().map(|stored| stored.record).collect()
}

/// Deduplicates values preserving first-seen order. Empty strings are skipped.
fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if !value.is_empty() && seen.insert(value.as_str()) {
            out.push(value.clone());
        }
    }
    out
}

pub fn distinct_inventors(records: &[PatentRecord]) -> Vec<String> {
    distinct(records.iter().flat_map(|r| r.inventors.iter()))
}

pub fn distinct_assignees(records: &[PatentRecord]) -> Vec<String> {
    distinct(records.iter().flat_map(|r| r.assignees.iter()))
}

pub fn distinct_titles(records: &[PatentRecord]) -> Vec<String> {
    distinct(records.iter().map(|r| &r.title))
}
