//! Error Taxonomy
//!
//! Archive-level and document-level failures never abort a batch; they are
//! recorded and the pipeline moves on. Only zone-store I/O is process-fatal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LakeError {
    /// The zip central directory could not be read. Fatal for that archive only.
    #[error("archive {archive} is corrupt: {source}")]
    ArchiveCorrupt {
        archive: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("document is truncated")]
    DocumentTruncated,

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// `patent_id` already stored with different content.
    #[error("patent {patent_id} already stored with different content")]
    Conflict { patent_id: String },

    #[error("invalid CPC filter pattern '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("zone store I/O error: {0}")]
    Zone(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LakeError>;

/// Stable reason code carried by a rejected record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    IncompleteDocument,
    MalformedXml,
    MissingRequiredField,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::IncompleteDocument => "incomplete-document",
            RejectReason::MalformedXml => "malformed-xml",
            RejectReason::MissingRequiredField => "missing-required-field",
        }
    }
}

impl LakeError {
    /// Maps a per-document failure onto the reason code stored on the
    /// rejected record. Archive, store and query errors have none.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            LakeError::DocumentTruncated => Some(RejectReason::IncompleteDocument),
            LakeError::MalformedXml(_) => Some(RejectReason::MalformedXml),
            LakeError::MissingRequiredField(_) => Some(RejectReason::MissingRequiredField),
            _ => None,
        }
    }

    /// Client errors are the caller's fault and never a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LakeError::InvalidFilter { .. })
    }
}
