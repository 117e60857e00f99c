use super::types::{FileRef, Zone};
use crate::error::Result;

use std::io::{Read, Seek};

/// Seekable byte source handed out by `ZoneStore::open`; zip readers need `Seek`.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Storage for the staged zones.
///
/// Every failure is an I/O failure and is treated as process-fatal by the
/// pipeline; files are left in their last known zone.
pub trait ZoneStore: Send + Sync {
    /// Moves `file` to `target`. Fails for moves that do not go forward in
    /// the lifecycle.
    fn relocate(&self, file: &FileRef, target: &FileRef) -> Result<FileRef>;

    /// Moves `file` into `to`, keeping its relative path.
    fn move_file(&self, file: &FileRef, to: Zone) -> Result<FileRef> {
        self.relocate(file, &FileRef::new(to, file.path.clone()))
    }

    /// All files of a zone, recursively, sorted by relative path.
    fn list(&self, zone: Zone) -> Result<Vec<FileRef>>;

    /// Deletes the contents of a zone and recreates its empty subdirectories.
    fn wipe(&self, zone: Zone) -> Result<()>;

    fn open(&self, file: &FileRef) -> Result<Box<dyn ReadSeek>>;

    fn read(&self, file: &FileRef) -> Result<Vec<u8>>;

    /// Replaces the file's content atomically, creating parents as needed.
    fn write(&self, file: &FileRef, bytes: &[u8]) -> Result<()>;

    fn exists(&self, file: &FileRef) -> bool;
}

pub(crate) fn check_forward(file: &FileRef, target: &FileRef) -> std::io::Result<()> {
    if file.zone.can_move_to(target.zone) {
        return Ok(());
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("cannot move {} backwards into {}", file, target.zone),
    ))
}
