//! In-memory Zone Store
//!
//! Same contract as the directory-backed store without touching disk.

use super::store::{ReadSeek, ZoneStore, check_forward};
use super::types::{FileRef, Zone};
use crate::error::Result;

use dashmap::DashMap;
use std::io::{Cursor, Error, ErrorKind};
use std::path::PathBuf;

#[derive(Default)]
pub struct MemoryZoneStore {
    files: DashMap<(Zone, PathBuf), Vec<u8>>,
}

impl MemoryZoneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self, zone: Zone) -> usize {
        self.files.iter().filter(|entry| entry.key().0 == zone).count()
    }

    fn not_found(file: &FileRef) -> Error {
        Error::new(ErrorKind::NotFound, format!("{} not found", file))
    }
}

impl ZoneStore for MemoryZoneStore {
    fn relocate(&self, file: &FileRef, target: &FileRef) -> Result<FileRef> {
        check_forward(file, target)?;
        let (_, bytes) = self
            .files
            .remove(&(file.zone, file.path.clone()))
            .ok_or_else(|| Self::not_found(file))?;

        self.files
            .insert((target.zone, target.path.clone()), bytes);
        Ok(target.clone())
    }

    fn list(&self, zone: Zone) -> Result<Vec<FileRef>> {
        let mut files: Vec<FileRef> = self
            .files
            .iter()
            .filter(|entry| entry.key().0 == zone)
            .map(|entry| FileRef::new(zone, entry.key().1.clone()))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn wipe(&self, zone: Zone) -> Result<()> {
        self.files.retain(|key, _| key.0 != zone);
        Ok(())
    }

    fn open(&self, file: &FileRef) -> Result<Box<dyn ReadSeek>> {
        Ok(Box::new(Cursor::new(self.read(file)?)))
    }

    fn read(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.files
            .get(&(file.zone, file.path.clone()))
            .map(|bytes| bytes.value().clone())
            .ok_or_else(|| Self::not_found(file).into())
    }

    fn write(&self, file: &FileRef, bytes: &[u8]) -> Result<()> {
        self.files
            .insert((file.zone, file.path.clone()), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, file: &FileRef) -> bool {
        self.files.contains_key(&(file.zone, file.path.clone()))
    }
}
