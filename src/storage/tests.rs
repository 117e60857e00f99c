//! Storage Module Tests
//!
//! Validates the Patent Store's uniqueness rule, its CPC index and the
//! durable artifacts it is restored from.
//!
//! ## Test Scopes
//! - **Upsert**: insert, no-op re-insert, conflicts, concurrent callers.
//! - **Scans**: `all_matching` ordering, prefix index and regex fallback, distinct projections.
//! - **Audit logs**: duplicates and rejected records, de-duplicated by provenance.
//! - **Persistence**: JSON Lines artifacts and restore through the in-memory zone store.

#[cfg(test)]
mod tests {
    use crate::error::{LakeError, RejectReason};
    use crate::query::filter::CpcFilter;
    use crate::storage::handlers::handle_stats;
    use crate::storage::index::CpcIndex;
    use crate::storage::persist;
    use crate::storage::types::{ByteRange, PatentRecord, RecordStatus, Rejection};
    use crate::storage::{PatentStore, UpsertOutcome};
    use crate::zones::{MemoryZoneStore, ZoneStore};

    use axum::http::StatusCode;
    use axum::{Extension, Json};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn record(id: &str, codes: &[&str], inventors: &[&str], start: u64) -> PatentRecord {
        PatentRecord {
            patent_id: id.to_string(),
            title: format!("Title {}", id),
            inventors: inventors.iter().map(|s| s.to_string()).collect(),
            assignees: vec!["Acme Inc.".to_string()],
            cpc_codes: codes.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            abstract_text: String::new(),
            filing_date: NaiveDate::from_ymd_opt(2023, 1, 10),
            grant_date: NaiveDate::from_ymd_opt(2025, 5, 6),
            source_archive: "ipg250506.zip".to_string(),
            source_entry: "ipg250506.xml".to_string(),
            source_offset: ByteRange {
                start,
                end: start + 100,
            },
            status: RecordStatus::Valid,
            rejection: None,
        }
    }

    fn rejected(start: u64) -> PatentRecord {
        let mut r = record("", &[], &[], start);
        r.status = RecordStatus::Rejected;
        r.rejection = Some(Rejection {
            reason: RejectReason::MalformedXml,
            fragment: "<us-patent-grant><broken>".to_string(),
        });
        r
    }

    // ============================================================
    // UPSERT TESTS
    // ============================================================

    #[test]
    fn test_upsert_inserts_then_is_noop_for_identical_record() {
        // ARRANGE
        let store = PatentStore::new();
        let r = record("11000001", &["G16B40/00"], &["Jane Doe"], 0);

        // ACT
        let first = store.upsert(r.clone()).unwrap();
        let second = store.upsert(r.clone()).unwrap();

        // ASSERT
        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Unchanged);
        assert_eq!(store.valid_count(), 1);
        assert_eq!(store.get("11000001"), Some(r));
    }

    #[test]
    fn test_upsert_conflict_keeps_original() {
        let store = PatentStore::new();
        let original = record("11000001", &["G16B40/00"], &["Jane Doe"], 0);
        let mut other = original.clone();
        other.title = "Different".to_string();
        other.source_archive = "ipg250513.zip".to_string();

        store.upsert(original.clone()).unwrap();
        let result = store.upsert(other);

        assert!(matches!(result, Err(LakeError::Conflict { ref patent_id }) if patent_id == "11000001"));
        assert_eq!(store.get("11000001").unwrap().title, original.title);
    }

    #[test]
    fn test_concurrent_upserts_store_one_valid_record() {
        // ARRANGE
        let store = Arc::new(PatentStore::new());

        // ACT: eight writers race on the same id with different content
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .upsert(record("11000001", &["G16B40/00"], &["Jane Doe"], i * 1000))
                        .is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        // ASSERT
        assert_eq!(successes, 1);
        assert_eq!(store.valid_count(), 1);
    }

    // ============================================================
    // SCAN TESTS
    // ============================================================

    #[test]
    fn test_all_matching_returns_first_seen_order() {
        let store = PatentStore::new();
        for (i, id) in ["300", "100", "200"].iter().enumerate() {
            store
                .upsert(record(id, &["G16B40/00"], &[], i as u64))
                .unwrap();
        }

        let ids: Vec<String> = store
            .all_matching(&CpcFilter::All)
            .into_iter()
            .map(|r| r.patent_id)
            .collect();

        assert_eq!(ids, vec!["300", "100", "200"]);
    }

    #[test]
    fn test_prefix_filter_uses_index_and_fallback() {
        // ARRANGE
        let store = PatentStore::new();
        store
            .upsert(record("1", &["G16B40/00", "G06N20/00"], &[], 0))
            .unwrap();
        store.upsert(record("2", &["A61B5/00"], &[], 1)).unwrap();
        store.upsert(record("3", &[], &[], 2)).unwrap();

        let ids = |filter: CpcFilter| -> Vec<String> {
            store
                .all_matching(&filter)
                .into_iter()
                .map(|r| r.patent_id)
                .collect()
        };

        // ACT + ASSERT
        assert_eq!(ids(CpcFilter::Prefix("G16B".into())), vec!["1"]);
        assert_eq!(ids(CpcFilter::Prefix("G".into())), vec!["1"]);
        assert_eq!(ids(CpcFilter::Prefix("G16B40".into())), vec!["1"], "Scan fallback");
        assert_eq!(ids(CpcFilter::Prefix("A61B5/00".into())), vec!["2"]);
        assert!(ids(CpcFilter::Prefix("g16b".into())).is_empty(), "Case-sensitive");
        assert!(ids(CpcFilter::Prefix("H04".into())).is_empty());
        assert_eq!(ids(CpcFilter::All), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_index_lookup_matches_scan() {
        let index = CpcIndex::new();
        index.insert("1", &BTreeSet::from(["G16B40/00".to_string()]));
        index.insert("2", &BTreeSet::from(["G16C10/00".to_string()]));

        assert!(index.is_indexed_prefix("G16"));
        assert!(!index.is_indexed_prefix("G16B40"));
        assert_eq!(index.lookup(&CpcFilter::Prefix("G16".into())).len(), 2);
        assert_eq!(
            index.lookup(&CpcFilter::from_params(Some("C1"), true).unwrap()),
            ["2".to_string()].into_iter().collect()
        );
        assert_eq!(index.distinct_code_count(), 2);
    }

    #[test]
    fn test_distinct_projections_dedup_in_first_seen_order() {
        let store = PatentStore::new();
        store
            .upsert(record("1", &["G16B40/00"], &["Jane Doe", "John Roe"], 0))
            .unwrap();
        store
            .upsert(record("2", &["G16B50/00"], &["John Roe", "Ann Lee"], 1))
            .unwrap();

        let filter = CpcFilter::Prefix("G16B".into());

        assert_eq!(
            store.distinct_inventors(&filter),
            vec!["Jane Doe", "John Roe", "Ann Lee"]
        );
        assert_eq!(store.distinct_assignees(&filter), vec!["Acme Inc."]);
        assert_eq!(store.distinct_titles(&filter), vec!["Title 1", "Title 2"]);
    }

    #[test]
    fn test_empty_titles_are_not_listed() {
        let store = PatentStore::new();
        let mut untitled = record("1", &[], &[], 0);
        untitled.title = String::new();
        store.upsert(untitled).unwrap();

        assert!(store.distinct_titles(&CpcFilter::All).is_empty());
    }

    // ============================================================
    // AUDIT LOG TESTS
    // ============================================================

    #[test]
    fn test_audit_logs_dedup_by_provenance() {
        let store = PatentStore::new();
        let duplicate = record("1", &[], &[], 500).into_duplicate();

        assert!(store.record_duplicate(duplicate.clone()));
        assert!(!store.record_duplicate(duplicate));
        assert!(store.record_rejected(rejected(0)));
        assert!(!store.record_rejected(rejected(0)));
        assert!(store.record_rejected(rejected(900)));

        let stats = store.stats();
        assert_eq!(stats.duplicate, 1);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.valid, 0, "Audit records never become valid");
        assert_eq!(store.rejected()[1].source_offset.start, 900);
    }

    // ============================================================
    // PERSISTENCE TESTS
    // ============================================================

    #[test]
    fn test_save_and_restore_archive_artifacts() {
        // ARRANGE
        let zones = MemoryZoneStore::new();
        let checksum = "0123456789abcdef0123";
        let accepted = vec![
            record("1", &["G16B40/00"], &["Jane Doe"], 0),
            record("1", &["G16B40/00"], &["Jane Doe"], 700).into_duplicate(),
        ];
        let rejects = vec![rejected(300)];

        // ACT
        persist::save_archive(&zones, "ipg250506", checksum, &accepted, &rejects).unwrap();
        let store = PatentStore::new();
        let count = persist::restore(&zones, &store).unwrap();

        // ASSERT
        assert!(zones.exists(&persist::accepted_file("ipg250506", checksum)));
        assert_eq!(
            persist::accepted_file("ipg250506", checksum).path.to_string_lossy(),
            "aggregated/ipg250506-0123456789ab.jsonl"
        );
        assert_eq!(count, 3);
        let stats = store.stats();
        assert_eq!((stats.valid, stats.duplicate, stats.rejected), (1, 1, 1));
        assert_eq!(store.rejected()[0].reject_reason(), Some(RejectReason::MalformedXml));
    }

    #[test]
    fn test_empty_record_sets_write_no_files() {
        let zones = MemoryZoneStore::new();

        persist::save_archive(&zones, "ipg250506", "abc", &[], &[]).unwrap();

        assert!(!zones.exists(&persist::accepted_file("ipg250506", "abc")));
        assert!(!zones.exists(&persist::rejected_file("ipg250506", "abc")));
    }

    #[test]
    fn test_from_json_lines_skips_bad_lines() {
        let good = persist::to_json_lines(&[record("1", &[], &[], 0)]).unwrap();
        let mut bytes = b"{not json}\n\n".to_vec();
        bytes.extend_from_slice(&good);

        let records = persist::from_json_lines(&bytes);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].patent_id, "1");
    }

    // ============================================================
    // HANDLER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_stats_handler() {
        let store = Arc::new(PatentStore::new());
        store.upsert(record("1", &["G16B40/00"], &[], 0)).unwrap();
        store.record_rejected(rejected(10));

        let (status, Json(stats)) = handle_stats(Extension(store)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.distinct_cpc_codes, 1);
    }
}
