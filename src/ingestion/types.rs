//! Ingestion Data Types
//!
//! Candidate documents produced by the splitter, per-archive progress reports
//! and the batch history kept for idempotency and audit.

use crate::storage::types::{ByteRange, RecordStatus};
use crate::zones::FileRef;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    Complete,
    /// The stream ended before the document's closing marker.
    Truncated,
}

/// One document cut out of a bulk XML file, not yet parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDocument {
    /// Position of the document within its bulk file.
    pub index: usize,
    pub xml: String,
    pub completeness: Completeness,
    pub offset: ByteRange,
}

/// Where a candidate document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub archive: String,
    pub entry: String,
}

/// Per-archive lifecycle. States only move forward; `Error` is reachable
/// from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveState {
    Pending,
    Unpacking,
    Splitting,
    Normalizing,
    Placed,
    Done,
    Error,
}

impl ArchiveState {
    fn rank(&self) -> u8 {
        match self {
            ArchiveState::Pending => 0,
            ArchiveState::Unpacking => 1,
            ArchiveState::Splitting => 2,
            ArchiveState::Normalizing => 3,
            ArchiveState::Placed => 4,
            ArchiveState::Done => 5,
            ArchiveState::Error => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ArchiveState::Done | ArchiveState::Error)
    }

    /// An archive with several bulk files alternates between splitting and
    /// normalizing once per file; every other move goes forward.
    pub fn can_advance_to(&self, next: ArchiveState) -> bool {
        if self.is_terminal() {
            return false;
        }
        let per_file = *self == ArchiveState::Normalizing && next == ArchiveState::Splitting;
        per_file || next == ArchiveState::Error || next.rank() >= self.rank()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveCounts {
    pub parsed: usize,
    pub valid: usize,
    pub rejected: usize,
    pub duplicate: usize,
}

impl ArchiveCounts {
    pub fn record(&mut self, status: RecordStatus) {
        self.parsed += 1;
        match status {
            RecordStatus::Valid => self.valid += 1,
            RecordStatus::Rejected => self.rejected += 1,
            RecordStatus::Duplicate => self.duplicate += 1,
        }
    }

    pub fn add(&mut self, other: &ArchiveCounts) {
        self.parsed += other.parsed;
        self.valid += other.valid;
        self.rejected += other.rejected;
        self.duplicate += other.duplicate;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveReport {
    pub archive: String,
    /// Hex SHA-256 of the archive bytes.
    pub checksum: String,
    pub state: ArchiveState,
    pub counts: ArchiveCounts,
    /// Already ingested by an earlier batch; nothing was reprocessed.
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_at: Option<FileRef>,
}

impl ArchiveReport {
    pub fn new(archive: &str) -> Self {
        Self {
            archive: archive.to_string(),
            checksum: String::new(),
            state: ArchiveState::Pending,
            counts: ArchiveCounts::default(),
            skipped: false,
            error: None,
            placed_at: None,
        }
    }

    /// Moves to `next`, ignoring (and logging) transitions the lifecycle forbids.
    pub fn advance(&mut self, next: ArchiveState) -> bool {
        if next == self.state {
            return true;
        }
        if !self.state.can_advance_to(next) {
            tracing::warn!(
                "Archive {}: ignoring transition {:?} -> {:?}",
                self.archive,
                self.state,
                next
            );
            return false;
        }
        tracing::debug!("Archive {}: {:?} -> {:?}", self.archive, self.state, next);
        self.state = next;
        true
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        tracing::error!("Archive {} failed: {}", self.archive, error);
        self.error = Some(error);
        self.advance(ArchiveState::Error);
    }

    pub fn is_done(&self) -> bool {
        self.state == ArchiveState::Done
    }
}

/// One run of the orchestrator over the archives waiting in `raw`.
///
/// Mutated only by the orchestrator while running; immutable once
/// `completed_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestBatch {
    pub batch_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Historical batches place their archives in `archived`.
    #[serde(default)]
    pub historical: bool,
    pub archives_processed: Vec<ArchiveReport>,
}

impl IngestBatch {
    pub fn new(historical: bool) -> Self {
        Self {
            batch_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            completed_at: None,
            historical,
            archives_processed: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn record_archive(&mut self, report: ArchiveReport) -> anyhow::Result<()> {
        if self.is_completed() {
            anyhow::bail!("batch {} is completed and cannot change", self.batch_id);
        }
        self.archives_processed.push(report);
        Ok(())
    }

    pub fn complete(&mut self) {
        if self.completed_at.is_none() {
            self.completed_at = Some(Utc::now());
        }
    }

    pub fn totals(&self) -> ArchiveCounts {
        let mut totals = ArchiveCounts::default();
        for report in &self.archives_processed {
            totals.add(&report.counts);
        }
        totals
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub historical: bool,
    /// Move `*.zip` files from `staging` into `raw/patents` before the run.
    pub promote_staged: bool,
}

/// Query string of `POST /api/ingest`.
#[derive(Debug, Default, Deserialize)]
pub struct IngestParams {
    pub historical: Option<String>,
}
