//! Record Normalizer
//!
//! Turns one candidate document into one `PatentRecord`. Every document
//! yields a record: failures become `rejected` records carrying a reason code
//! and the raw fragment, never errors.
//!
//! ## Classification
//! 1. `Truncated` candidate: rejected `incomplete-document`, nothing extracted.
//! 2. Not well-formed XML: rejected `malformed-xml`.
//! 3. No `patent_id` or no parsable `grant_date`: rejected
//!    `missing-required-field`, keeping whatever fields were found.
//! 4. Otherwise valid.
//!
//! Fields are looked up by element name along the known paths of the grant
//! and application formats. Unknown elements are ignored, so schema drift in
//! fields nobody reads never rejects a document.

use super::types::{CandidateDocument, Completeness, DocumentSource};
use crate::cpc::cpc_from_parts;
use crate::error::{LakeError, RejectReason};
use crate::storage::types::{ByteRange, PatentRecord, RecordStatus, Rejection};

use chrono::NaiveDate;
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::BTreeSet;

const BIBLIO_ELEMENTS: [&str; 2] = [
    "us-bibliographic-data-grant",
    "us-bibliographic-data-application",
];

pub fn normalize(doc: &CandidateDocument, source: &DocumentSource) -> PatentRecord {
    let mut record = blank_record(source, doc.offset);

    if doc.completeness == Completeness::Truncated {
        return reject(record, LakeError::DocumentTruncated, &doc.xml);
    }

    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let parsed = match Document::parse_with_options(&doc.xml, options) {
        Ok(parsed) => parsed,
        Err(err) => return reject(record, LakeError::MalformedXml(err.to_string()), &doc.xml),
    };

    extract_fields(parsed.root_element(), &mut record);

    if record.patent_id.is_empty() {
        return reject(record, LakeError::MissingRequiredField("patent_id"), &doc.xml);
    }
    if record.grant_date.is_none() {
        return reject(record, LakeError::MissingRequiredField("grant_date"), &doc.xml);
    }

    tracing::trace!(
        "Normalized {} from {}:{} @{}",
        record.patent_id,
        source.archive,
        source.entry,
        doc.offset.start
    );
    record
}

fn blank_record(source: &DocumentSource, offset: ByteRange) -> PatentRecord {
    PatentRecord {
        patent_id: String::new(),
        title: String::new(),
        inventors: Vec::new(),
        assignees: Vec::new(),
        cpc_codes: BTreeSet::new(),
        abstract_text: String::new(),
        filing_date: None,
        grant_date: None,
        source_archive: source.archive.clone(),
        source_entry: source.entry.clone(),
        source_offset: offset,
        status: RecordStatus::Valid,
        rejection: None,
    }
}

fn reject(mut record: PatentRecord, err: LakeError, fragment: &str) -> PatentRecord {
    let reason = err.reject_reason().unwrap_or(RejectReason::MalformedXml);
    tracing::debug!(
        "Rejecting document at {}:{} @{} ({}): {}",
        record.source_archive,
        record.source_entry,
        record.source_offset.start,
        reason.code(),
        err
    );
    record.status = RecordStatus::Rejected;
    record.rejection = Some(Rejection {
        reason,
        fragment: fragment.to_string(),
    });
    record
}

fn extract_fields(root: Node, record: &mut PatentRecord) {
    if let Some(abstract_node) = child(root, "abstract") {
        let paragraphs: Vec<String> = children(abstract_node, "p")
            .map(text_of)
            .filter(|text| !text.is_empty())
            .collect();
        record.abstract_text = paragraphs.join(" ");
    }

    let Some(biblio) = BIBLIO_ELEMENTS.iter().find_map(|name| child(root, name)) else {
        return;
    };

    record.patent_id = find(biblio, &["publication-reference", "document-id", "doc-number"])
        .map(text_of)
        .unwrap_or_default();
    record.grant_date = find(biblio, &["publication-reference", "document-id", "date"])
        .and_then(|node| parse_date(&text_of(node)));
    record.filing_date = find(biblio, &["application-reference", "document-id", "date"])
        .and_then(|node| parse_date(&text_of(node)));
    record.title = child(biblio, "invention-title")
        .map(text_of)
        .unwrap_or_default();
    record.inventors = extract_inventors(biblio);
    record.assignees = extract_assignees(root, biblio);
    record.cpc_codes = extract_cpc(biblio, &record.source_archive);
}

fn extract_inventors(biblio: Node) -> Vec<String> {
    let mut names = Vec::new();

    for parties in ["us-parties", "parties"] {
        if let Some(inventors) = find(biblio, &[parties, "inventors"]) {
            for inventor in children(inventors, "inventor") {
                push_unique(&mut names, party_name(inventor));
            }
        }
        if !names.is_empty() {
            return names;
        }
    }

    // Older grants list inventors only as applicants flagged as such.
    let applicants = find(biblio, &["us-parties", "us-applicants"])
        .into_iter()
        .flat_map(|list| children(list, "us-applicant"))
        .chain(
            find(biblio, &["parties", "applicants"])
                .into_iter()
                .flat_map(|list| children(list, "applicant")),
        );
    for applicant in applicants {
        let flagged = applicant
            .attributes()
            .any(|attr| attr.value().contains("inventor"));
        let book = child(applicant, "addressbook").unwrap_or(applicant);
        if flagged && child(book, "orgname").is_none() {
            push_unique(&mut names, party_name(applicant));
        }
    }
    names
}

fn extract_assignees(root: Node, biblio: Node) -> Vec<String> {
    let mut names = Vec::new();

    for path in [&["assignees"][..], &["parties", "assignees"][..]] {
        if let Some(assignees) = find(biblio, path) {
            for assignee in children(assignees, "assignee") {
                push_unique(&mut names, party_name(assignee));
            }
        }
        if !names.is_empty() {
            return names;
        }
    }

    for node in root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "assignee-name")
    {
        push_unique(&mut names, Some(text_of(node)));
    }
    names
}

fn extract_cpc(biblio: Node, archive: &str) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    let Some(classifications) = child(biblio, "classifications-cpc") else {
        return codes;
    };

    let blocks = children(classifications, "main-cpc").chain(children(classifications, "further-cpc"));
    for block in blocks {
        for entry in children(block, "classification-cpc") {
            let part = |name: &str| child(entry, name).map(text_of).unwrap_or_default();
            let (section, class, subclass, main_group, subgroup) = (
                part("section"),
                part("class"),
                part("subclass"),
                part("main-group"),
                part("subgroup"),
            );

            match cpc_from_parts(&section, &class, &subclass, &main_group, &subgroup) {
                Some(code) => {
                    codes.insert(code);
                }
                None => tracing::warn!(
                    "Dropping malformed CPC code '{}{}{}{}/{}' in {}",
                    section,
                    class,
                    subclass,
                    main_group,
                    subgroup,
                    archive
                ),
            }
        }
    }
    codes
}

/// Display name of an inventor, applicant or assignee: the organisation
/// name when present, otherwise `first-name last-name`.
fn party_name(party: Node) -> Option<String> {
    let book = child(party, "addressbook").unwrap_or(party);

    if let Some(org) = child(book, "orgname").map(text_of)
        && !org.is_empty()
    {
        return Some(org);
    }

    let first = child(book, "first-name").map(text_of).unwrap_or_default();
    let last = child(book, "last-name").map(text_of).unwrap_or_default();
    let name = format!("{} {}", first, last).trim().to_string();
    (!name.is_empty()).then_some(name)
}

fn push_unique(names: &mut Vec<String>, name: Option<String>) {
    if let Some(name) = name
        && !name.is_empty()
        && !names.contains(&name)
    {
        names.push(name);
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok();
    if date.is_none() && !raw.is_empty() {
        tracing::debug!("Unparsable date '{}'", raw);
    }
    date
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn find<'a, 'input>(node: Node<'a, 'input>, path: &[&str]) -> Option<Node<'a, 'input>> {
    path.iter().try_fold(node, |current, name| child(current, name))
}

/// All text below `node`, whitespace collapsed.
fn text_of(node: Node) -> String {
    let raw: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
