use serde::{Deserialize, Serialize};

/// Query string shared by all four query endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub cpc_class: Option<String>,
    pub use_regex: Option<String>,
}

impl QueryParams {
    pub fn new(cpc_class: Option<&str>, use_regex: bool) -> Self {
        Self {
            cpc_class: cpc_class.map(str::to_string),
            use_regex: Some(use_regex.to_string()),
        }
    }

    pub fn regex_enabled(&self) -> bool {
        parse_flag(self.use_regex.as_deref())
    }
}

/// Boolean query flag: true only for `true`, case-insensitively.
pub fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// The three distinct-value lists of one filtered record set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub inventors: Vec<String>,
    pub assignees: Vec<String>,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    /// Offending pattern, for invalid filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}
