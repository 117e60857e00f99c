//! CPC Filter Predicate
//!
//! One predicate shared by every query. It is built once per request and
//! every projection of that request closes over the same value.

use crate::error::{LakeError, Result};

use regex::{Regex, RegexBuilder};

/// Compiled size cap for client supplied patterns.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone)]
pub enum CpcFilter {
    /// No filter: every valid record.
    All,
    /// Case-sensitive literal prefix of a code.
    Prefix(String),
    /// Regular expression with search semantics: it may match anywhere in
    /// the code unless the pattern anchors itself.
    Pattern(Regex),
}

impl CpcFilter {
    /// An absent or empty `cpc_class` means no filter.
    pub fn from_params(cpc_class: Option<&str>, use_regex: bool) -> Result<Self> {
        let Some(value) = cpc_class.filter(|v| !v.is_empty()) else {
            return Ok(CpcFilter::All);
        };

        if !use_regex {
            return Ok(CpcFilter::Prefix(value.to_string()));
        }

        RegexBuilder::new(value)
            .size_limit(REGEX_SIZE_LIMIT)
            .build()
            .map(CpcFilter::Pattern)
            .map_err(|source| LakeError::InvalidFilter {
                pattern: value.to_string(),
                source,
            })
    }

    pub fn matches_code(&self, code: &str) -> bool {
        match self {
            CpcFilter::All => true,
            CpcFilter::Prefix(prefix) => code.starts_with(prefix.as_str()),
            CpcFilter::Pattern(regex) => regex.is_match(code),
        }
    }
}
