//! Zone Store Tests
//!
//! ## Test Scopes
//! - **Zone rules**: lifecycle ordering and name parsing.
//! - **FsZoneStore**: scaffolding, moves, listing, atomic writes and wipes on a temp dir.
//! - **MemoryZoneStore**: the same contract without disk.

#[cfg(test)]
mod tests {
    use crate::zones::{FileRef, FsZoneStore, MemoryZoneStore, Zone, ZoneStore};
    use std::io::Read;

    // ============================================================
    // ZONE RULES
    // ============================================================

    #[test]
    fn test_zone_moves_are_forward_only() {
        assert!(Zone::Staging.can_move_to(Zone::Raw));
        assert!(Zone::Raw.can_move_to(Zone::Transformed));
        assert!(!Zone::Transformed.can_move_to(Zone::Raw));
        assert!(!Zone::Raw.can_move_to(Zone::Raw));
    }

    #[test]
    fn test_archived_accepts_every_other_zone() {
        for zone in Zone::ALL {
            if zone != Zone::Archived {
                assert!(zone.can_move_to(Zone::Archived), "{} -> archived", zone);
            }
        }
        assert!(!Zone::Archived.can_move_to(Zone::Staging));
    }

    #[test]
    fn test_zone_from_str() {
        assert_eq!("raw".parse::<Zone>().unwrap(), Zone::Raw);
        assert_eq!("Transformed".parse::<Zone>().unwrap(), Zone::Transformed);
        assert!("bronze".parse::<Zone>().is_err());
    }

    #[test]
    fn test_file_ref_names() {
        let file = FileRef::new(Zone::Raw, "patents/ipg250506.zip");
        assert_eq!(file.file_name(), "ipg250506.zip");
        assert_eq!(file.stem(), "ipg250506");
        assert!(file.extension_is("ZIP"));
        assert!(file.is_under("patents"));
        assert!(!file.is_under("metadata"));
    }

    // ============================================================
    // FS ZONE STORE
    // ============================================================

    #[test]
    fn test_fs_scaffold_creates_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());

        store.scaffold().unwrap();

        assert!(dir.path().join("staging").is_dir());
        assert!(dir.path().join("raw/patents").is_dir());
        assert!(dir.path().join("raw/logs").is_dir());
        assert!(dir.path().join("prepared/rejected").is_dir());
        assert!(dir.path().join("transformed/reports").is_dir());
        assert!(dir.path().join("archived/aggregated").is_dir());
    }

    #[test]
    fn test_fs_write_list_and_move() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());
        store.scaffold().unwrap();

        let file = FileRef::new(Zone::Raw, "patents/ipg240507.zip");
        store.write(&file, b"zip bytes").unwrap();

        let listed = store.list(Zone::Raw).unwrap();
        assert_eq!(listed, vec![file.clone()]);

        let moved = store.move_file(&file, Zone::Transformed).unwrap();
        assert_eq!(moved, FileRef::new(Zone::Transformed, "patents/ipg240507.zip"));
        assert!(!store.exists(&file));
        assert!(store.exists(&moved));
        assert_eq!(store.read(&moved).unwrap(), b"zip bytes");
    }

    #[test]
    fn test_fs_relocate_into_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());
        let staged = FileRef::new(Zone::Staging, "ipg250506.zip");
        store.write(&staged, b"zip").unwrap();

        let target = FileRef::new(Zone::Raw, "patents/ipg250506.zip");
        let moved = store.relocate(&staged, &target).unwrap();

        assert_eq!(moved, target);
        assert!(dir.path().join("raw/patents/ipg250506.zip").is_file());
        assert!(store.list(Zone::Staging).unwrap().is_empty());
    }

    #[test]
    fn test_fs_backward_move_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());
        let file = FileRef::new(Zone::Transformed, "patents/a.zip");
        store.write(&file, b"x").unwrap();

        let result = store.move_file(&file, Zone::Raw);

        assert!(result.is_err());
        assert!(store.exists(&file), "File stays in its last known zone");
    }

    #[test]
    fn test_fs_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());
        let file = FileRef::new(Zone::Transformed, "reports/batches.json");

        store.write(&file, b"[1]").unwrap();
        store.write(&file, b"[1,2]").unwrap();

        assert_eq!(store.read(&file).unwrap(), b"[1,2]");
        assert_eq!(store.list(Zone::Transformed).unwrap().len(), 1);
    }

    #[test]
    fn test_fs_wipe_recreates_structure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());
        store.scaffold().unwrap();
        store
            .write(&FileRef::new(Zone::Prepared, "rejected/a.jsonl"), b"{}")
            .unwrap();

        store.wipe(Zone::Prepared).unwrap();

        assert!(store.list(Zone::Prepared).unwrap().is_empty());
        assert!(dir.path().join("prepared/validated").is_dir());
    }

    #[test]
    fn test_fs_list_missing_zone_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path().join("nowhere"));

        assert!(store.list(Zone::Staging).unwrap().is_empty());
    }

    #[test]
    fn test_fs_open_is_seekable_reader() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsZoneStore::new(dir.path());
        let file = FileRef::new(Zone::Staging, "a.zip");
        store.write(&file, b"abc").unwrap();

        let mut reader = store.open(&file).unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();

        assert_eq!(content, "abc");
    }

    // ============================================================
    // MEMORY ZONE STORE
    // ============================================================

    #[test]
    fn test_memory_move_and_wipe() {
        let store = MemoryZoneStore::new();
        let file = FileRef::new(Zone::Staging, "ipg1.zip");
        store.write(&file, b"1").unwrap();

        let raw = store.move_file(&file, Zone::Raw).unwrap();
        assert_eq!(store.file_count(Zone::Staging), 0);
        assert_eq!(store.file_count(Zone::Raw), 1);

        store.wipe(Zone::Raw).unwrap();
        assert!(!store.exists(&raw));
    }

    #[test]
    fn test_memory_missing_file_errors() {
        let store = MemoryZoneStore::new();
        let file = FileRef::new(Zone::Raw, "patents/missing.zip");

        assert!(store.read(&file).is_err());
        assert!(store.move_file(&file, Zone::Transformed).is_err());
    }
}
