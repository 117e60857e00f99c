//! Durable Record Artifacts
//!
//! Records are written as JSON Lines, one file per processed archive:
//! - `transformed/aggregated/<stem>-<checksum12>.jsonl`: valid and duplicate records
//! - `prepared/rejected/<stem>-<checksum12>.jsonl`: rejected records
//!
//! The checksum suffix keeps two different archives with the same file name
//! from overwriting each other's artifacts.

use super::memory::PatentStore;
use super::types::PatentRecord;
use crate::error::Result;
use crate::zones::{FileRef, Zone, ZoneStore};

pub const ACCEPTED_SUBDIR: &str = "aggregated";
pub const REJECTED_SUBDIR: &str = "rejected";

fn artifact_name(stem: &str, checksum: &str) -> String {
    let short = checksum.get(..12).unwrap_or(checksum);
    format!("{}-{}.jsonl", stem, short)
}

pub fn accepted_file(stem: &str, checksum: &str) -> FileRef {
    FileRef::new(
        Zone::Transformed,
        format!("{}/{}", ACCEPTED_SUBDIR, artifact_name(stem, checksum)),
    )
}

pub fn rejected_file(stem: &str, checksum: &str) -> FileRef {
    FileRef::new(
        Zone::Prepared,
        format!("{}/{}", REJECTED_SUBDIR, artifact_name(stem, checksum)),
    )
}

pub fn to_json_lines(records: &[PatentRecord]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Parses JSON Lines. Unreadable lines are skipped with a warning so one bad
/// line does not hide the rest of the file.
pub fn from_json_lines(bytes: &[u8]) -> Vec<PatentRecord> {
    String::from_utf8_lossy(bytes)
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(number, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!("Skipping unreadable record on line {}: {}", number + 1, err);
                None
            }
        })
        .collect()
}

/// Writes the artifacts of one archive. Empty record sets write no file.
pub fn save_archive(
    zones: &dyn ZoneStore,
    stem: &str,
    checksum: &str,
    accepted: &[PatentRecord],
    rejected: &[PatentRecord],
) -> Result<()> {
    if !accepted.is_empty() {
        zones.write(&accepted_file(stem, checksum), &to_json_lines(accepted)?)?;
    }
    if !rejected.is_empty() {
        zones.write(&rejected_file(stem, checksum), &to_json_lines(rejected)?)?;
    }
    tracing::debug!(
        "Saved {} accepted and {} rejected records for {}",
        accepted.len(),
        rejected.len(),
        stem
    );
    Ok(())
}

/// Loads every artifact back into `store`. Returns the number of records read.
pub fn restore(zones: &dyn ZoneStore, store: &PatentStore) -> Result<usize> {
    let mut files: Vec<FileRef> = zones
        .list(Zone::Transformed)?
        .into_iter()
        .filter(|f| f.is_under(ACCEPTED_SUBDIR) && f.extension_is("jsonl"))
        .collect();
    files.extend(
        zones
            .list(Zone::Prepared)?
            .into_iter()
            .filter(|f| f.is_under(REJECTED_SUBDIR) && f.extension_is("jsonl")),
    );

    let mut count = 0;
    for file in &files {
        let records = from_json_lines(&zones.read(file)?);
        count += records.len();
        for record in records {
            store.restore(record);
        }
    }

    tracing::info!("Restored {} records from {} artifacts", count, files.len());
    Ok(count)
}
