//! CPC Classification Codes
//!
//! Canonical form: `SECTION CLASS SUBCLASS MAINGROUP/SUBGROUP` with no
//! spaces, e.g. `G16B40/00`. Section is one letter (A-H or Y), class two
//! digits, subclass one letter, main group 1-4 digits, subgroup 2-6 digits.

use regex::Regex;
use std::sync::LazyLock;

static CPC_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-HY]\d{2}[A-Z]\d{1,4}/\d{2,6}$").expect("CPC code pattern compiles")
});

/// Normalizes a textual code such as `g16b 40/00` into `G16B40/00`.
pub fn normalize_cpc(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    CPC_CODE.is_match(&compact).then_some(compact)
}

/// Assembles a code from the separate elements of a `classification-cpc`
/// block. Single-digit classes and subgroups are zero padded.
pub fn cpc_from_parts(
    section: &str,
    class: &str,
    subclass: &str,
    main_group: &str,
    subgroup: &str,
) -> Option<String> {
    let raw = format!(
        "{}{}{}{}/{}",
        section.trim(),
        pad2(class.trim()),
        subclass.trim(),
        main_group.trim(),
        pad2(subgroup.trim())
    );
    normalize_cpc(&raw)
}

fn pad2(digits: &str) -> String {
    if digits.len() == 1 && digits.chars().all(|c| c.is_ascii_digit()) {
        format!("0{}", digits)
    } else {
        digits.to_string()
    }
}

/// Fixed-width hierarchical prefixes of a canonical code: section, class
/// and subclass (`G`, `G16`, `G16B`). Group levels are variable width and
/// are not string prefixes of each other, so they are left out.
pub fn cpc_prefixes(code: &str) -> Vec<&str> {
    [1, 3, 4]
        .into_iter()
        .filter_map(|len| code.get(..len))
        .collect()
}
