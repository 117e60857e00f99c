//! Document Splitter
//!
//! A bulk file from the patent office is a concatenation of complete XML
//! documents (each with its own declaration and doctype), not one document.
//! The splitter scans the byte stream for the start and end tags of the
//! configured document element and cuts out each document without parsing
//! anything, so a corrupt record cannot take down its neighbours.
//!
//! ## State machine
//! - `depth` counts open marker elements, including nested ones of the same name.
//! - A document is emitted the moment `depth` returns to zero.
//! - At end of stream an unmatched open marker yields the remaining bytes
//!   flagged `Truncated`.
//! - An XML declaration or doctype cannot occur inside a document, so one
//!   seen while a document is open means its end tag is missing: the open
//!   document is emitted `Truncated` up to that point and splitting resumes.
//!
//! Only the current document (plus one read chunk) is held in memory.

use super::types::{CandidateDocument, Completeness};
use crate::storage::types::ByteRange;

use std::io::{self, Cursor, ErrorKind, Read};

const READ_CHUNK: usize = 64 * 1024;

/// Bytes inspected when the file name does not tell the document type.
const SNIFF_BYTES: usize = 8 * 1024;

/// Prolog constructs that only ever start a new document.
const PROLOG_STARTS: [&[u8]; 2] = [b"<?xml", b"<!DOCTYPE"];

pub const GRANT_ELEMENT: &str = "us-patent-grant";
pub const APPLICATION_ELEMENT: &str = "us-patent-application";

/// The top-level element that delimits documents in a bulk file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMarker {
    element: String,
    open: Vec<u8>,
    close: Vec<u8>,
}

impl DocumentMarker {
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            open: format!("<{}", element).into_bytes(),
            close: format!("</{}", element).into_bytes(),
        }
    }

    pub fn grant() -> Self {
        Self::new(GRANT_ELEMENT)
    }

    pub fn application() -> Self {
        Self::new(APPLICATION_ELEMENT)
    }

    /// Picks the marker from the bulk file name: `ipg*`/`pg*` files hold
    /// grants, `ipa*`/`pa*` files hold applications. `None` for any other
    /// name; use [`DocumentMarker::detect`] on the content then.
    pub fn for_file_name(name: &str) -> Option<Self> {
        let base = name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(name)
            .to_ascii_lowercase();

        if base.contains("ipg") || base.starts_with("pg") {
            Some(Self::grant())
        } else if base.contains("ipa") || base.starts_with("pa") {
            Some(Self::application())
        } else {
            None
        }
    }

    /// Picks the marker from the first bytes of a bulk file: whichever root
    /// element appears first. Falls back to grants when neither does.
    pub fn detect(head: &[u8]) -> Self {
        let grant = Self::grant();
        let application = Self::application();
        let position = |marker: &Self| {
            head.windows(marker.open.len())
                .position(|window| window == marker.open.as_slice())
        };

        match (position(&grant), position(&application)) {
            (Some(g), Some(a)) if a < g => application,
            (None, Some(_)) => application,
            (Some(_), _) => grant,
            (None, None) => {
                tracing::warn!(
                    "No <{}> or <{}> in the first {} bytes, splitting on <{}>",
                    GRANT_ELEMENT,
                    APPLICATION_ELEMENT,
                    head.len(),
                    GRANT_ELEMENT
                );
                grant
            }
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }
}

enum Tag {
    /// Not enough bytes buffered to classify the tag.
    Undecided,
    Other,
    Open { end: usize, self_closing: bool },
    Close { end: usize },
    /// Start of the next document's prolog.
    Prolog,
}

enum Scan {
    Emit(CandidateDocument),
    NeedMore,
}

/// Lazy iterator over the documents of one bulk file.
///
/// Never fails: read errors end the stream, and whatever document was open
/// at that point comes out as `Truncated`. The sequence is deterministic, so
/// splitting the same bytes again yields the same documents.
pub struct DocumentSplitter<R> {
    reader: R,
    marker: DocumentMarker,
    buf: Vec<u8>,
    /// Absolute stream offset of `buf[0]`.
    base: u64,
    /// Next position in `buf` to scan from.
    cursor: usize,
    doc_start: Option<usize>,
    depth: usize,
    index: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> DocumentSplitter<R> {
    pub fn new(reader: R, marker: DocumentMarker) -> Self {
        Self {
            reader,
            marker,
            buf: Vec::with_capacity(READ_CHUNK),
            base: 0,
            cursor: 0,
            doc_start: None,
            depth: 0,
            index: 0,
            eof: false,
            finished: false,
        }
    }

    /// Drops bytes nothing can refer to any more, then reads one more chunk.
    fn fill(&mut self) {
        let keep_from = self.doc_start.unwrap_or(self.cursor);
        if keep_from > 0 {
            self.buf.drain(..keep_from);
            self.base += keep_from as u64;
            self.cursor -= keep_from;
            if let Some(start) = self.doc_start.as_mut() {
                *start -= keep_from;
            }
        }

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return;
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(
                        "Read error after {} bytes, ending split: {}",
                        self.base + self.buf.len() as u64,
                        err
                    );
                    self.eof = true;
                    return;
                }
            }
        }
    }

    fn find_gt(&self, from: usize) -> Option<usize> {
        self.buf[from..]
            .iter()
            .position(|&b| b == b'>')
            .map(|rel| from + rel)
    }

    /// Classifies a name match at `name_end`: the tag name must end there
    /// (whitespace, `>` or `/`), otherwise it is a longer, unrelated name.
    fn finish_tag(&self, name_end: usize, closing: bool) -> Tag {
        let Some(&next) = self.buf.get(name_end) else {
            return if self.eof { Tag::Other } else { Tag::Undecided };
        };
        let boundary = next == b'>' || next.is_ascii_whitespace() || (!closing && next == b'/');
        if !boundary {
            return Tag::Other;
        }

        match self.find_gt(name_end) {
            Some(gt) if closing => Tag::Close { end: gt + 1 },
            Some(gt) => Tag::Open {
                end: gt + 1,
                self_closing: self.buf[gt - 1] == b'/',
            },
            None if !self.eof => Tag::Undecided,
            None if closing => Tag::Other,
            // stream ended inside the start tag
            None => Tag::Open {
                end: self.buf.len(),
                self_closing: false,
            },
        }
    }

    fn classify(&self, at: usize) -> Tag {
        let rest = &self.buf[at..];
        let (open, close) = (&self.marker.open, &self.marker.close);

        if rest.starts_with(close) {
            return self.finish_tag(at + close.len(), true);
        }
        if rest.starts_with(open) {
            return self.finish_tag(at + open.len(), false);
        }
        if !self.eof && (open.starts_with(rest) || close.starts_with(rest)) {
            return Tag::Undecided;
        }
        if self.doc_start.is_some() {
            return self.classify_prolog(rest);
        }
        Tag::Other
    }

    fn classify_prolog(&self, rest: &[u8]) -> Tag {
        for prolog in PROLOG_STARTS {
            if rest.starts_with(prolog) {
                return match rest.get(prolog.len()) {
                    Some(next) if next.is_ascii_whitespace() => Tag::Prolog,
                    Some(_) => Tag::Other,
                    None if self.eof => Tag::Other,
                    None => Tag::Undecided,
                };
            }
            if !self.eof && prolog.starts_with(rest) {
                return Tag::Undecided;
            }
        }
        Tag::Other
    }

    fn scan(&mut self) -> Scan {
        while let Some(rel) = self.buf[self.cursor..].iter().position(|&b| b == b'<') {
            let at = self.cursor + rel;
            match self.classify(at) {
                Tag::Undecided => {
                    self.cursor = at;
                    return Scan::NeedMore;
                }
                Tag::Other => self.cursor = at + 1,
                Tag::Prolog => {
                    self.cursor = at;
                    let doc = self.emit(at, Completeness::Truncated);
                    tracing::warn!(
                        "Document {} has no </{}>, cut at offset {}",
                        doc.index,
                        self.marker.element,
                        doc.offset.end
                    );
                    return Scan::Emit(doc);
                }
                Tag::Open { end, self_closing } => {
                    self.cursor = end;
                    if self.doc_start.is_none() {
                        self.doc_start = Some(at);
                        self.depth = 0;
                    }
                    if !self_closing {
                        self.depth += 1;
                    } else if self.depth == 0 {
                        return Scan::Emit(self.emit(end, Completeness::Complete));
                    }
                }
                Tag::Close { end } => {
                    self.cursor = end;
                    if self.doc_start.is_none() {
                        tracing::debug!(
                            "Stray </{}> at offset {}",
                            self.marker.element,
                            self.base + at as u64
                        );
                        continue;
                    }
                    self.depth -= 1;
                    if self.depth == 0 {
                        return Scan::Emit(self.emit(end, Completeness::Complete));
                    }
                }
            }
        }
        self.cursor = self.buf.len();
        Scan::NeedMore
    }

    fn emit(&mut self, end: usize, completeness: Completeness) -> CandidateDocument {
        let start = self.doc_start.take().unwrap_or(end);
        self.depth = 0;

        let doc = CandidateDocument {
            index: self.index,
            xml: String::from_utf8_lossy(&self.buf[start..end]).into_owned(),
            completeness,
            offset: ByteRange {
                start: self.base + start as u64,
                end: self.base + end as u64,
            },
        };
        self.index += 1;
        doc
    }
}

impl<R: Read> Iterator for DocumentSplitter<R> {
    type Item = CandidateDocument;

    fn next(&mut self) -> Option<CandidateDocument> {
        if self.finished {
            return None;
        }

        loop {
            match self.scan() {
                Scan::Emit(doc) => return Some(doc),
                Scan::NeedMore if self.eof => {
                    self.finished = true;
                    if self.doc_start.is_some() {
                        let end = self.buf.len();
                        let doc = self.emit(end, Completeness::Truncated);
                        tracing::warn!(
                            "Document {} truncated at offset {}",
                            doc.index,
                            doc.offset.end
                        );
                        return Some(doc);
                    }
                    return None;
                }
                Scan::NeedMore => self.fill(),
            }
        }
    }
}

/// Marker for one bulk file: from its name when recognised, otherwise
/// detected from its first bytes. The returned reader still yields the
/// whole stream.
pub fn select_marker<'a>(
    name: &str,
    mut stream: Box<dyn Read + 'a>,
) -> io::Result<(DocumentMarker, Box<dyn Read + 'a>)> {
    if let Some(marker) = DocumentMarker::for_file_name(name) {
        return Ok((marker, stream));
    }

    let mut head = Vec::with_capacity(SNIFF_BYTES);
    stream.by_ref().take(SNIFF_BYTES as u64).read_to_end(&mut head)?;
    let marker = DocumentMarker::detect(&head);
    tracing::debug!("Unrecognised bulk file name {}, detected <{}>", name, marker.element);
    Ok((marker, Box::new(Cursor::new(head).chain(stream))))
}

/// Splits an in-memory bulk file.
pub fn split_str(content: &str, marker: DocumentMarker) -> Vec<CandidateDocument> {
    DocumentSplitter::new(content.as_bytes(), marker).collect()
}
