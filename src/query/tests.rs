//! Query Module Tests
//!
//! ## Test Scopes
//! - **Filter**: literal prefix vs regex search semantics, flag parsing.
//! - **Engine**: projections and the single-pass summary.
//! - **Handlers**: status codes and error bodies of the HTTP endpoints.

#[cfg(test)]
mod tests {
    use crate::error::LakeError;
    use crate::query::filter::CpcFilter;
    use crate::query::handlers::{handle_inventors, handle_summary, handle_titles};
    use crate::query::types::{QueryParams, parse_flag};
    use crate::query::QueryEngine;
    use crate::storage::types::{ByteRange, PatentRecord, RecordStatus};
    use crate::storage::PatentStore;

    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::{Extension, Json};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn record(id: &str, title: &str, inventor: &str, assignee: &str, codes: &[&str]) -> PatentRecord {
        PatentRecord {
            patent_id: id.to_string(),
            title: title.to_string(),
            inventors: vec![inventor.to_string()],
            assignees: vec![assignee.to_string()],
            cpc_codes: codes.iter().map(|c| c.to_string()).collect(),
            abstract_text: String::new(),
            filing_date: None,
            grant_date: NaiveDate::from_ymd_opt(2025, 5, 6),
            source_archive: "ipg250506.zip".to_string(),
            source_entry: "ipg250506.xml".to_string(),
            source_offset: ByteRange::default(),
            status: RecordStatus::Valid,
            rejection: None,
        }
    }

    /// Two records: one bioinformatics grant and one medical device grant.
    fn engine() -> Arc<QueryEngine> {
        let store = Arc::new(PatentStore::new());
        store
            .upsert(record("1", "Genome assembly", "Jane Doe", "Acme Genomics", &["G16B40/00"]))
            .unwrap();
        store
            .upsert(record("2", "Pulse oximeter", "John Roe", "Medi Devices", &["A61B5/00"]))
            .unwrap();
        Arc::new(QueryEngine::new(store))
    }

    fn params(cpc_class: &str, use_regex: bool) -> QueryParams {
        QueryParams::new(Some(cpc_class), use_regex)
    }

    // ============================================================
    // FILTER TESTS
    // ============================================================

    #[test]
    fn test_literal_prefix_is_case_sensitive() {
        let filter = CpcFilter::from_params(Some("G16B"), false).unwrap();

        assert!(filter.matches_code("G16B40/00"));
        assert!(!filter.matches_code("A61B5/00"));
        assert!(!filter.matches_code("XG16B40/00"));
        assert!(!CpcFilter::from_params(Some("g16b"), false)
            .unwrap()
            .matches_code("G16B40/00"));
    }

    #[test]
    fn test_regex_anchor_comes_from_pattern() {
        let anchored = CpcFilter::from_params(Some("^G16B"), true).unwrap();
        let unanchored = CpcFilter::from_params(Some("G16B"), true).unwrap();

        assert!(anchored.matches_code("G16B40/00"));
        assert!(!anchored.matches_code("XG16B40/00"));
        assert!(unanchored.matches_code("XG16B40/00"), "Search semantics without ^");
    }

    #[test]
    fn test_documented_star_pattern_is_a_repetition() {
        // `B*` means zero or more `B`, so `^G16B*` accepts any code starting with G16.
        let filter = CpcFilter::from_params(Some("^G16B*"), true).unwrap();

        assert!(filter.matches_code("G16B40/00"));
        assert!(filter.matches_code("G16H50/20"));
        assert!(!filter.matches_code("A61B5/00"));
    }

    #[test]
    fn test_absent_or_empty_class_means_all() {
        assert!(matches!(CpcFilter::from_params(None, true).unwrap(), CpcFilter::All));
        assert!(matches!(CpcFilter::from_params(Some(""), false).unwrap(), CpcFilter::All));
    }

    #[test]
    fn test_invalid_regex_is_invalid_filter() {
        let err = CpcFilter::from_params(Some("G16B("), true).unwrap_err();

        assert!(matches!(err, LakeError::InvalidFilter { ref pattern, .. } if pattern == "G16B("));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("TRUE")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(None));
    }

    // ============================================================
    // ENGINE TESTS
    // ============================================================

    #[test]
    fn test_prefix_query_returns_only_matching_record() {
        let engine = engine();

        let p = params("G16B", false);

        assert_eq!(engine.inventors(&p).unwrap(), vec!["Jane Doe"]);
        assert_eq!(engine.titles(&p).unwrap(), vec!["Genome assembly"]);
        assert_eq!(engine.assignees(&p).unwrap(), vec!["Acme Genomics"]);
    }

    #[test]
    fn test_no_filter_returns_full_corpus() {
        let engine = engine();

        let titles = engine.titles(&QueryParams::default()).unwrap();

        assert_eq!(titles, vec!["Genome assembly", "Pulse oximeter"]);
    }

    #[test]
    fn test_summary_with_no_matches_is_all_empty() {
        let engine = engine();

        let summary = engine.summary(&params("H04L", false)).unwrap();

        assert!(summary.inventors.is_empty());
        assert!(summary.assignees.is_empty());
        assert!(summary.titles.is_empty());
    }

    #[test]
    fn test_summary_projects_one_record_set() {
        let engine = engine();

        let summary = engine.summary(&params("B5/", true)).unwrap();

        assert_eq!(summary.inventors, vec!["John Roe"]);
        assert_eq!(summary.assignees, vec!["Medi Devices"]);
        assert_eq!(summary.titles, vec!["Pulse oximeter"]);
    }

    // ============================================================
    // HANDLER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_inventors_handler_ok() {
        let result = handle_inventors(Extension(engine()), Query(params("^G16B", true))).await;

        let Json(inventors) = result.unwrap();
        assert_eq!(inventors, vec!["Jane Doe"]);
    }

    #[tokio::test]
    async fn test_invalid_regex_is_bad_request() {
        // ARRANGE
        let engine = engine();

        // ACT
        let result = handle_titles(Extension(engine.clone()), Query(params("(", true))).await;

        // ASSERT
        let (status, Json(body)) = result.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.pattern.as_deref(), Some("("));
        assert!(!body.error.is_empty());

        // The store is untouched
        assert_eq!(engine.titles(&QueryParams::default()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_literal_mode_accepts_regex_metacharacters() {
        let result = handle_summary(Extension(engine()), Query(params("(", false))).await;

        let Json(summary) = result.unwrap();
        assert!(summary.titles.is_empty());
    }
}
