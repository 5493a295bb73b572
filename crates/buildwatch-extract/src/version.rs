//! Version-string recovery from the binary metadata file.
//!
//! The client's version is stored as a constant string inside the metadata
//! blob, directly after another constant (`127.0.0.1`) from the same class.
//! Scanning for that anchor followed by low-value control bytes and a dotted
//! five-integer pattern recovers it without parsing the format. This is a
//! heuristic against an opaque binary: ambiguity is expected and non-fatal.

use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<regex::bytes::Regex> = LazyLock::new(|| {
    regex::bytes::Regex::new(r"(?-u)127\.0\.0\.1[\x00-\x20]*(\d(?:\.\d){4})")
        .expect("version pattern is valid")
});

/// Result of scanning the metadata blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionScan {
    /// Exactly one match: this is the version.
    Unique(String),
    /// Zero or more than one match; the version cannot be determined.
    Ambiguous { matches: usize },
}

impl VersionScan {
    /// The version when the scan was unambiguous.
    pub fn version(&self) -> Option<&str> {
        match self {
            VersionScan::Unique(v) => Some(v),
            VersionScan::Ambiguous { .. } => None,
        }
    }
}

/// Scan raw metadata bytes for the version string.
pub fn scan_version(metadata: &[u8]) -> VersionScan {
    let captures: Vec<String> = VERSION_PATTERN
        .captures_iter(metadata)
        .filter_map(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .collect();

    match captures.as_slice() {
        [single] => VersionScan::Unique(single.clone()),
        other => VersionScan::Ambiguous {
            matches: other.len(),
        },
    }
}
