//! Snapshot materialization.
//!
//! A snapshot is a self-contained directory: the extraction work products,
//! the raw asset tree as a single gzip-compressed tar archive (for
//! reproducibility), and `snapshot.json` with the source descriptor and
//! creation timestamp. It is fully written before the diff or publish steps
//! ever see it; a partially-written snapshot is never referenced anywhere.

use buildwatch_core::fsutil::{copy_tree, reset_dir};
use buildwatch_core::{BuildDescriptor, Error, Result, Snapshot, SnapshotId};
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

/// File name of the raw-asset archive inside a snapshot.
pub const BUILD_FILES_ARCHIVE: &str = "build_files.tar.gz";

/// File name of the snapshot metadata document.
pub const SNAPSHOT_METADATA: &str = "snapshot.json";

/// Materialize a snapshot under `dest` from the extraction work directory
/// and the raw asset tree.
///
/// `dest` is reset first; on success it contains the complete snapshot and
/// the returned [`Snapshot`] points at it.
pub fn archive_snapshot(
    descriptor: &BuildDescriptor,
    extracted_version: Option<String>,
    raw_root: &Path,
    work_dir: &Path,
    dest: &Path,
) -> Result<Snapshot> {
    let id = SnapshotId::derive(&descriptor.build_hash, Utc::now());
    info!(snapshot = %id, "archiving snapshot");

    reset_dir(dest).map_err(|e| Error::archive(format!("resetting {}: {}", dest.display(), e)))?;

    let copied = copy_tree(work_dir, dest)
        .map_err(|e| Error::archive(format!("copying work products: {}", e)))?;
    debug!(files = copied, "copied work products");

    archive_raw_assets(raw_root, &dest.join(BUILD_FILES_ARCHIVE))?;

    let snapshot = Snapshot {
        id,
        created_at: Utc::now(),
        root: dest.to_path_buf(),
        descriptor: descriptor.clone(),
        extracted_version,
    };
    let json = serde_json::to_string_pretty(&snapshot)?;
    fs::write(dest.join(SNAPSHOT_METADATA), json)
        .map_err(|e| Error::archive(format!("writing metadata: {}", e)))?;

    Ok(snapshot)
}

/// Pack the raw asset tree into a single `tar.gz` inside the snapshot.
fn archive_raw_assets(raw_root: &Path, archive_path: &Path) -> Result<()> {
    debug!(root = %raw_root.display(), "archiving raw assets");

    let file = File::create(archive_path)
        .map_err(|e| Error::archive(format!("creating {}: {}", archive_path.display(), e)))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder
        .append_dir_all(".", raw_root)
        .map_err(|e| Error::archive(format!("packing raw assets: {}", e)))?;
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| Error::archive(format!("finishing archive: {}", e)))?;

    Ok(())
}
