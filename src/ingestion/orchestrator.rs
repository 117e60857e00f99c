//! Ingest Orchestrator
//!
//! Drives each archive in `raw/patents` through
//! `pending -> unpacking -> splitting -> normalizing -> placed -> done`,
//! one archive at a time.
//!
//! ## Failure policy
//! - Document failures become rejected records and only move counters.
//! - Archive failures (unreadable zip) put that archive in `error`, leave the
//!   file where it is, and the batch moves on to the next archive.
//! - Zone store I/O failures abort the batch.
//!
//! ## Idempotency
//! An archive whose file name and SHA-256 are recorded as done in the ledger
//! is not reprocessed. Behind that, the store's uniqueness on `patent_id` turns any
//! collision into an audited `duplicate` instead of a second valid record.

use super::ledger::BatchLedger;
use super::normalizer::normalize;
use super::splitter::{DocumentSplitter, select_marker};
use super::types::{ArchiveReport, ArchiveState, BatchOptions, DocumentSource, IngestBatch};
use super::unpacker::{ArchiveUnpacker, archive_checksum};
use crate::storage::memory::PatentStore;
use crate::storage::persist;
use crate::storage::types::{PatentRecord, RecordStatus};
use crate::zones::{FileRef, Zone, ZoneStore};

use anyhow::Context;
use std::sync::Arc;

pub const ARCHIVE_SUBDIR: &str = "patents";

pub struct IngestOrchestrator {
    zones: Arc<dyn ZoneStore>,
    store: Arc<PatentStore>,
    ledger: BatchLedger,
}

/// Records admitted from one archive, split by artifact.
#[derive(Default)]
struct Admitted {
    accepted: Vec<PatentRecord>,
    rejected: Vec<PatentRecord>,
}

impl IngestOrchestrator {
    pub fn new(zones: Arc<dyn ZoneStore>, store: Arc<PatentStore>) -> anyhow::Result<Self> {
        let ledger = BatchLedger::load(zones.as_ref())?;
        Ok(Self {
            zones,
            store,
            ledger,
        })
    }

    pub fn batches(&self) -> &[IngestBatch] {
        self.ledger.batches()
    }

    /// Moves every zip waiting in `staging` into `raw/patents`.
    pub fn promote_staged(&self) -> anyhow::Result<usize> {
        let staged: Vec<FileRef> = self
            .zones
            .list(Zone::Staging)?
            .into_iter()
            .filter(|file| file.extension_is("zip"))
            .collect();

        for file in &staged {
            let target = FileRef::new(
                Zone::Raw,
                format!("{}/{}", ARCHIVE_SUBDIR, file.file_name()),
            );
            self.zones
                .relocate(file, &target)
                .with_context(|| format!("promoting {}", file))?;
        }

        if !staged.is_empty() {
            tracing::info!("Promoted {} staged archives into raw", staged.len());
        }
        Ok(staged.len())
    }

    /// Runs one batch over every archive in `raw/patents`.
    ///
    /// The ledger is saved after each archive, so a crash loses at most the
    /// archive in flight.
    pub fn run_batch(&mut self, options: &BatchOptions) -> anyhow::Result<IngestBatch> {
        if options.promote_staged {
            self.promote_staged()?;
        }

        let mut batch = IngestBatch::new(options.historical);
        tracing::info!(
            "Starting batch {} (historical: {})",
            batch.batch_id,
            batch.historical
        );
        self.checkpoint(&batch)?;

        let archives: Vec<FileRef> = self
            .zones
            .list(Zone::Raw)?
            .into_iter()
            .filter(|file| file.is_under(ARCHIVE_SUBDIR) && file.extension_is("zip"))
            .collect();

        for archive in &archives {
            let report = self
                .process_archive(archive, options.historical)
                .with_context(|| format!("processing {}", archive))?;
            batch.record_archive(report)?;
            self.checkpoint(&batch)?;
        }

        batch.complete();
        self.checkpoint(&batch)?;

        let totals = batch.totals();
        tracing::info!(
            "Batch {} complete: {} archives, {} parsed, {} valid, {} rejected, {} duplicate",
            batch.batch_id,
            batch.archives_processed.len(),
            totals.parsed,
            totals.valid,
            totals.rejected,
            totals.duplicate
        );
        Ok(batch)
    }

    fn checkpoint(&mut self, batch: &IngestBatch) -> anyhow::Result<()> {
        self.ledger.record(batch)?;
        self.ledger.save(self.zones.as_ref())
    }

    /// Processes one archive to a terminal state. Returns `Err` only for
    /// zone store failures.
    pub fn process_archive(&self, file: &FileRef, historical: bool) -> anyhow::Result<ArchiveReport> {
        let name = file.file_name();
        let mut report = ArchiveReport::new(&name);
        report.checksum = archive_checksum(self.zones.open(file)?)?;

        if let Some(batch_id) = self.ledger.find_done(&name, &report.checksum) {
            tracing::info!(
                "Archive {} already ingested by batch {}, skipping",
                name,
                batch_id
            );
            report.skipped = true;
            report.placed_at = Some(self.place(file, historical)?);
            report.advance(ArchiveState::Placed);
            report.advance(ArchiveState::Done);
            return Ok(report);
        }

        report.advance(ArchiveState::Unpacking);
        let mut unpacker = match ArchiveUnpacker::open(&name, self.zones.open(file)?) {
            Ok(unpacker) => unpacker,
            Err(err) => {
                report.fail(err.to_string());
                return Ok(report);
            }
        };

        let mut admitted = Admitted::default();
        let mut failure = None;
        for entry in unpacker.entries().to_vec() {
            report.advance(ArchiveState::Splitting);
            let opened = unpacker
                .open_entry(&entry)
                .map_err(|err| err.to_string())
                .and_then(|stream| {
                    select_marker(&entry, stream).map_err(|err| format!("reading {}: {}", entry, err))
                });
            let (marker, stream) = match opened {
                Ok(opened) => opened,
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            };

            let source = DocumentSource {
                archive: name.clone(),
                entry: entry.clone(),
            };
            tracing::debug!("Splitting {}:{} on <{}>", name, entry, marker.element());

            report.advance(ArchiveState::Normalizing);
            for candidate in DocumentSplitter::new(stream, marker) {
                let status = self.admit(normalize(&candidate, &source), &mut admitted);
                report.counts.record(status);
            }
        }

        // Records already admitted are persisted even when the archive fails,
        // so the artifacts always agree with the store.
        persist::save_archive(
            self.zones.as_ref(),
            &file.stem(),
            &report.checksum,
            &admitted.accepted,
            &admitted.rejected,
        )?;

        if let Some(error) = failure {
            report.fail(error);
            return Ok(report);
        }

        report.placed_at = Some(self.place(file, historical)?);
        report.advance(ArchiveState::Placed);
        report.advance(ArchiveState::Done);
        tracing::info!(
            "Archive {} done: {} parsed, {} valid, {} rejected, {} duplicate",
            name,
            report.counts.parsed,
            report.counts.valid,
            report.counts.rejected,
            report.counts.duplicate
        );
        Ok(report)
    }

    fn admit(&self, record: PatentRecord, admitted: &mut Admitted) -> RecordStatus {
        if record.status == RecordStatus::Rejected {
            self.store.record_rejected(record.clone());
            admitted.rejected.push(record);
            return RecordStatus::Rejected;
        }

        match self.store.upsert(record.clone()) {
            Ok(_) => {
                admitted.accepted.push(record);
                RecordStatus::Valid
            }
            Err(err) => {
                tracing::warn!(
                    "{}; keeping the original, duplicate from {}:{} @{}..{}",
                    err,
                    record.source_archive,
                    record.source_entry,
                    record.source_offset.start,
                    record.source_offset.end
                );
                let duplicate = record.into_duplicate();
                self.store.record_duplicate(duplicate.clone());
                admitted.accepted.push(duplicate);
                RecordStatus::Duplicate
            }
        }
    }

    fn place(&self, file: &FileRef, historical: bool) -> anyhow::Result<FileRef> {
        let zone = if historical {
            Zone::Archived
        } else {
            Zone::Transformed
        };
        Ok(self.zones.move_file(file, zone)?)
    }
}
