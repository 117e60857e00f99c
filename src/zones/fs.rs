//! Directory-backed Zone Store
//!
//! Layout: `<root>/<zone>/<subdir>/...`. Writes go to a temp file in the
//! destination directory and are renamed into place.

use super::store::{ReadSeek, ZoneStore, check_forward};
use super::types::{FileRef, Zone};
use crate::error::Result;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct FsZoneStore {
    root: PathBuf,
}

impl FsZoneStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates every zone directory and its fixed subdirectories.
    pub fn scaffold(&self) -> Result<()> {
        for zone in Zone::ALL {
            self.scaffold_zone(zone)?;
        }
        tracing::debug!("Scaffolded data lake at {}", self.root.display());
        Ok(())
    }

    fn scaffold_zone(&self, zone: Zone) -> Result<()> {
        let dir = self.zone_dir(zone);
        fs::create_dir_all(&dir)?;
        for subdir in zone.subdirs() {
            fs::create_dir_all(dir.join(subdir))?;
        }
        Ok(())
    }

    fn zone_dir(&self, zone: Zone) -> PathBuf {
        self.root.join(zone.name())
    }

    fn resolve(&self, file: &FileRef) -> PathBuf {
        self.zone_dir(file.zone).join(&file.path)
    }
}

impl ZoneStore for FsZoneStore {
    fn relocate(&self, file: &FileRef, target: &FileRef) -> Result<FileRef> {
        check_forward(file, target)?;

        let src = self.resolve(file);
        let dst = self.resolve(target);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }

        // rename fails across filesystems; fall back to copy + remove
        if let Err(err) = fs::rename(&src, &dst) {
            tracing::debug!("rename {} failed ({}), copying instead", src.display(), err);
            fs::copy(&src, &dst)?;
            fs::remove_file(&src)?;
        }

        tracing::info!("Moved {} -> {}", file, target);
        Ok(target.clone())
    }

    fn list(&self, zone: Zone) -> Result<Vec<FileRef>> {
        let dir = self.zone_dir(zone);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(".tmp") {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&dir) {
                files.push(FileRef::new(zone, relative));
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn wipe(&self, zone: Zone) -> Result<()> {
        let dir = self.zone_dir(zone);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        self.scaffold_zone(zone)?;
        tracing::warn!("Wiped zone {}", zone);
        Ok(())
    }

    fn open(&self, file: &FileRef) -> Result<Box<dyn ReadSeek>> {
        Ok(Box::new(fs::File::open(self.resolve(file))?))
    }

    fn read(&self, file: &FileRef) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(file))?)
    }

    fn write(&self, file: &FileRef, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(file);
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.zone_dir(file.zone));
        fs::create_dir_all(&parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, file: &FileRef) -> bool {
        self.resolve(file).is_file()
    }
}
