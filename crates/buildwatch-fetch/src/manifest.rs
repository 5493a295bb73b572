//! Checksum manifest: the file list advertised next to a build.
//!
//! ```json
//! {"files": [{"file": "resources.assets", "checksum": "...", "size": 123}, ...]}
//! ```
//!
//! Only the relative path is consumed; checksum and size fields are accepted
//! but unused.

use buildwatch_core::{Error, Result};
use serde::Deserialize;
use std::path::{Component, Path};

/// Name of the manifest file at the build URL root.
pub const MANIFEST_FILENAME: &str = "checksum.json";

/// Parsed checksum manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ChecksumManifest {
    pub files: Vec<ManifestEntry>,
}

/// One file of the build's asset set.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// Relative path of the asset under the build root
    pub file: String,
}

impl ChecksumManifest {
    /// Parse a manifest document, rejecting entries that would escape the
    /// output root.
    pub fn parse(json: &str) -> Result<Self> {
        let manifest: ChecksumManifest = serde_json::from_str(json)?;
        for entry in &manifest.files {
            if !is_safe_relative(Path::new(&entry.file)) {
                return Err(Error::fetch(
                    "",
                    format!("manifest entry escapes output root: {}", entry.file),
                ));
            }
        }
        Ok(manifest)
    }
}

fn is_safe_relative(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
