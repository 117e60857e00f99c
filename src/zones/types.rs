use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A named stage of the data lake lifecycle.
///
/// Declaration order is the lifecycle order; a file may only move forward.
/// `Archived` is last, so it accepts files from every other zone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Staging,
    Raw,
    Prepared,
    Transformed,
    Archived,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Staging,
        Zone::Raw,
        Zone::Prepared,
        Zone::Transformed,
        Zone::Archived,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Zone::Staging => "staging",
            Zone::Raw => "raw",
            Zone::Prepared => "prepared",
            Zone::Transformed => "transformed",
            Zone::Archived => "archived",
        }
    }

    /// Fixed subdirectory convention of each zone. `archived` mirrors the
    /// subzones of the zones that feed it.
    pub fn subdirs(&self) -> &'static [&'static str] {
        match self {
            Zone::Staging => &[],
            Zone::Raw => &["patents", "metadata", "logs"],
            Zone::Prepared => &["patents", "validated", "rejected"],
            Zone::Transformed => &["enriched", "aggregated", "reports"],
            Zone::Archived => &[
                "patents",
                "metadata",
                "logs",
                "validated",
                "rejected",
                "enriched",
                "aggregated",
                "reports",
            ],
        }
    }

    pub fn can_move_to(&self, to: Zone) -> bool {
        *self < to
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::ALL
            .iter()
            .copied()
            .find(|zone| zone.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown zone '{}'", s))
    }
}

/// A file inside one zone, addressed by its path relative to the zone root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub zone: Zone,
    pub path: PathBuf,
}

impl FileRef {
    pub fn new(zone: Zone, path: impl Into<PathBuf>) -> Self {
        Self {
            zone,
            path: path.into(),
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its extension, used to name derived artifacts.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn extension_is(&self, ext: &str) -> bool {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
            .unwrap_or(false)
    }

    /// True when the file sits below `subdir` of its zone.
    pub fn is_under(&self, subdir: &str) -> bool {
        self.path.starts_with(Path::new(subdir))
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone, self.path.display())
    }
}
