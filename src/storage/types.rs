//! Patent Record Types
//!
//! `PatentRecord` is the normalized form of one patent document and the row
//! type of the Patent Store. Rejected documents are records too, so the
//! audit log and the artifacts share one shape.

use crate::error::RejectReason;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Byte range of a document inside its bulk XML file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Valid,
    /// Same `patent_id` already stored from another source; the original wins.
    Duplicate,
    Rejected,
}

/// Why a document was rejected, plus the raw fragment it failed on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub fragment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatentRecord {
    /// Publication number. Empty only on rejected records.
    pub patent_id: String,
    pub title: String,
    pub inventors: Vec<String>,
    pub assignees: Vec<String>,
    pub cpc_codes: BTreeSet<String>,
    #[serde(default)]
    pub abstract_text: String,
    pub filing_date: Option<NaiveDate>,
    /// Always present on valid records.
    pub grant_date: Option<NaiveDate>,
    pub source_archive: String,
    /// Bulk XML file inside the archive.
    pub source_entry: String,
    pub source_offset: ByteRange,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

/// Key identifying where a record came from; used to keep the audit logs
/// free of repeats when an archive is processed again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProvenanceKey {
    pub archive: String,
    pub entry: String,
    pub start: u64,
}

impl PatentRecord {
    pub fn is_valid(&self) -> bool {
        self.status == RecordStatus::Valid
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        self.rejection.as_ref().map(|r| r.reason)
    }

    pub fn provenance_key(&self) -> ProvenanceKey {
        ProvenanceKey {
            archive: self.source_archive.clone(),
            entry: self.source_entry.clone(),
            start: self.source_offset.start,
        }
    }

    pub fn into_duplicate(mut self) -> Self {
        self.status = RecordStatus::Duplicate;
        self
    }
}

/// Counters exposed by `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StoreStats {
    pub valid: usize,
    pub duplicate: usize,
    pub rejected: usize,
    pub distinct_cpc_codes: usize,
}
