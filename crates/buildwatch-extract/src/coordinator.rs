//! Extraction coordination.
//!
//! Drives the external asset parser and metadata dumper over a build's raw
//! assets, recovers the embedded version string, and merges the
//! manifest-selected structured documents into canonical per-category files
//! under the work directory.

use crate::merge::merge_documents;
use crate::version::{scan_version, VersionScan};
use buildwatch_core::fsutil::write_with_parents;
use buildwatch_core::tools::{AssetExtractor, MetadataDumper};
use buildwatch_core::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// File name of the binary metadata blob inside the raw assets.
const METADATA_FILENAME: &str = "global-metadata.dat";

/// File name of the compiled game binary inside the raw assets.
const BINARY_FILENAME: &str = "GameAssembly.dll";

/// File name the version string is written to in the work directory.
pub const VERSION_FILENAME: &str = "version.txt";

/// What extraction produced for one build.
#[derive(Debug)]
pub struct ExtractionOutput {
    /// Directory the asset parser wrote its typed sub-resources to
    pub extracted_dir: PathBuf,

    /// Version recovered from the metadata blob, when unambiguous
    pub version: Option<String>,

    /// Merged documents written under `<work>/xml/`
    pub merged_documents: Vec<PathBuf>,
}

/// Orchestrates the external tools over a raw asset tree.
pub struct ExtractionCoordinator {
    asset_extractor: Option<Arc<dyn AssetExtractor>>,
    metadata_dumper: Option<Arc<dyn MetadataDumper>>,
}

impl ExtractionCoordinator {
    pub fn new(
        asset_extractor: Option<Arc<dyn AssetExtractor>>,
        metadata_dumper: Option<Arc<dyn MetadataDumper>>,
    ) -> Self {
        Self {
            asset_extractor,
            metadata_dumper,
        }
    }

    /// Run extraction over `raw_root`, writing results under `work_dir`.
    ///
    /// Tool failures propagate and abort the run. Version ambiguity does
    /// not: an empty version file is written and the build continues.
    pub async fn run(&self, raw_root: &Path, work_dir: &Path) -> Result<ExtractionOutput> {
        fs::create_dir_all(work_dir)?;

        let version = self.extract_version(raw_root, work_dir)?;

        let extracted_dir = work_dir.join("extracted");
        if let Some(extractor) = &self.asset_extractor {
            info!("extracting asset bundles");
            extractor.extract(raw_root, &extracted_dir).await?;
        } else {
            warn!("no asset extractor configured, skipping bundle extraction");
            fs::create_dir_all(&extracted_dir)?;
        }

        if let Some(dumper) = &self.metadata_dumper {
            match (
                find_file(raw_root, BINARY_FILENAME),
                find_file(raw_root, METADATA_FILENAME),
            ) {
                (Some(binary), Some(metadata)) => {
                    info!("dumping binary metadata");
                    dumper
                        .dump(&binary, &metadata, &work_dir.join("dumped"))
                        .await?;
                }
                _ => warn!("binary or metadata file not found, skipping dumper"),
            }
        }

        let manifest_file = extracted_dir.join("TextAsset").join("manifest.json");
        let merged_documents = if manifest_file.is_file() {
            merge_documents(&manifest_file, &extracted_dir, work_dir)?
        } else {
            error!(path = %manifest_file.display(), "build has no document manifest");
            Vec::new()
        };

        Ok(ExtractionOutput {
            extracted_dir,
            version,
            merged_documents,
        })
    }

    /// Scan the metadata blob for the version string and record the result.
    /// Ambiguity is logged and recorded as an empty version, never an error.
    fn extract_version(&self, raw_root: &Path, work_dir: &Path) -> Result<Option<String>> {
        let Some(metadata_file) = find_file(raw_root, METADATA_FILENAME) else {
            warn!("no {} in raw assets, skipping version scan", METADATA_FILENAME);
            write_with_parents(&work_dir.join(VERSION_FILENAME), "")?;
            return Ok(None);
        };

        let data = fs::read(&metadata_file)?;
        match scan_version(&data) {
            VersionScan::Unique(version) => {
                info!(%version, "extracted version string");
                write_with_parents(&work_dir.join(VERSION_FILENAME), &version)?;
                Ok(Some(version))
            }
            VersionScan::Ambiguous { matches } => {
                error!(matches, "could not extract version string unambiguously");
                write_with_parents(&work_dir.join(VERSION_FILENAME), "")?;
                Ok(None)
            }
        }
    }
}

/// Locate a file by name anywhere under `root` (installer unpacks bury the
/// data directory one or more levels deep).
fn find_file(root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .find(|e| e.file_type().is_file() && e.file_name() == name)
        .map(|e| e.into_path())
}
