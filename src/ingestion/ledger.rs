//! Batch Ledger
//!
//! Append-only history of ingest batches, persisted as one JSON array in
//! `transformed/reports/batches.json`. It is the checksum registry that makes
//! re-running ingestion over an already processed archive a no-op.

use super::types::IngestBatch;
use crate::zones::{FileRef, Zone, ZoneStore};

use anyhow::Context;

pub const LEDGER_PATH: &str = "reports/batches.json";

pub fn ledger_file() -> FileRef {
    FileRef::new(Zone::Transformed, LEDGER_PATH)
}

#[derive(Debug, Default)]
pub struct BatchLedger {
    batches: Vec<IngestBatch>,
}

impl BatchLedger {
    /// Loads the ledger, starting empty when none was written yet.
    pub fn load(zones: &dyn ZoneStore) -> anyhow::Result<Self> {
        let file = ledger_file();
        if !zones.exists(&file) {
            return Ok(Self::default());
        }

        let bytes = zones.read(&file).context("reading batch ledger")?;
        let batches: Vec<IngestBatch> =
            serde_json::from_slice(&bytes).context("parsing batch ledger")?;
        tracing::info!("Loaded {} batches from ledger", batches.len());
        Ok(Self { batches })
    }

    pub fn save(&self, zones: &dyn ZoneStore) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.batches)?;
        zones
            .write(&ledger_file(), &bytes)
            .context("writing batch ledger")?;
        Ok(())
    }

    /// Records the current state of a batch. A running batch is replaced on
    /// every call; a completed batch can no longer be replaced.
    pub fn record(&mut self, batch: &IngestBatch) -> anyhow::Result<()> {
        match self
            .batches
            .iter_mut()
            .find(|existing| existing.batch_id == batch.batch_id)
        {
            Some(existing) if existing.is_completed() => {
                anyhow::bail!("batch {} is completed and cannot change", batch.batch_id)
            }
            Some(existing) => *existing = batch.clone(),
            None => self.batches.push(batch.clone()),
        }
        Ok(())
    }

    /// Batch id that fully processed this archive, if any. An archive is
    /// identified by its file name together with the SHA-256 of its bytes.
    pub fn find_done(&self, archive: &str, checksum: &str) -> Option<&str> {
        self.batches
            .iter()
            .find(|batch| {
                batch.archives_processed.iter().any(|report| {
                    report.archive == archive
                        && report.checksum == checksum
                        && report.is_done()
                        && !report.skipped
                })
            })
            .map(|batch| batch.batch_id.as_str())
    }

    pub fn batches(&self) -> &[IngestBatch] {
        &self.batches
    }
}
