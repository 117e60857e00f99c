//! Archive Unpacker
//!
//! Opens a bulk zip archive and hands out its XML entries one at a time as
//! streaming readers; nothing is decompressed up front. Reopening the same
//! bytes lists the same entries in the same order.

use crate::error::{LakeError, Result};

use sha2::{Digest, Sha256};
use std::io::{self, Read, Seek};
use zip::ZipArchive;

pub struct ArchiveUnpacker<R: Read + Seek> {
    name: String,
    zip: ZipArchive<R>,
    entries: Vec<String>,
}

impl<R: Read + Seek> ArchiveUnpacker<R> {
    /// Reads the central directory. A zip that cannot be read fails with
    /// `ArchiveCorrupt`.
    pub fn open(name: &str, reader: R) -> Result<Self> {
        let zip = ZipArchive::new(reader).map_err(|source| LakeError::ArchiveCorrupt {
            archive: name.to_string(),
            source,
        })?;

        // file_names() order is not stable across versions of the zip crate
        let mut entries: Vec<String> = zip
            .file_names()
            .filter(|entry| is_bulk_xml(entry))
            .map(str::to_string)
            .collect();
        entries.sort();

        tracing::debug!("Archive {} holds {} XML files", name, entries.len());
        Ok(Self {
            name: name.to_string(),
            zip,
            entries,
        })
    }

    /// Bulk XML entry names, in a stable order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Streams one entry. The reader borrows the archive, so entries are
    /// consumed one after another.
    pub fn open_entry(&mut self, entry: &str) -> Result<Box<dyn Read + '_>> {
        let archive = self.name.clone();
        let file = self
            .zip
            .by_name(entry)
            .map_err(|source| LakeError::ArchiveCorrupt { archive, source })?;
        Ok(Box::new(file))
    }
}

fn is_bulk_xml(entry: &str) -> bool {
    !entry.ends_with('/')
        && !entry.starts_with("__MACOSX/")
        && entry.to_ascii_lowercase().ends_with(".xml")
}

/// Hex SHA-256 of everything `reader` yields.
pub fn archive_checksum(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
