//! Snapshot promotion.
//!
//! Publication is the last action of a run. The finished snapshot is staged
//! into the history area under a hidden name and atomically renamed to its
//! final id, then the current pointer is swapped. At every observable
//! instant the pointer resolves to a complete snapshot, either the old one
//! or the new one, never a partial copy.

use buildwatch_core::fsutil::copy_tree;
use buildwatch_core::{Error, PublishedState, Result, Snapshot};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Copy the snapshot into the history area under its id.
///
/// An existing directory with the same id is a no-op, not an error: ids are
/// content-derived, so the bytes are already there (a previous run published
/// the snapshot but may have died before swapping the pointer).
pub fn store_in_history(snapshot: &Snapshot, publish_dir: &Path) -> Result<PathBuf> {
    let final_dir = publish_dir.join(snapshot.id.as_str());
    if final_dir.exists() {
        debug!(snapshot = %snapshot.id, "already in history, skipping copy");
        return Ok(final_dir);
    }

    fs::create_dir_all(publish_dir)
        .map_err(|e| Error::publish(format!("creating {}: {}", publish_dir.display(), e)))?;

    let staging = publish_dir.join(format!(".{}.partial", snapshot.id));
    if staging.exists() {
        // leftover from a crashed copy; start over
        fs::remove_dir_all(&staging)
            .map_err(|e| Error::publish(format!("clearing stale staging: {}", e)))?;
    }

    copy_tree(&snapshot.root, &staging)
        .map_err(|e| Error::publish(format!("staging snapshot: {}", e)))?;
    fs::rename(&staging, &final_dir)
        .map_err(|e| Error::publish(format!("renaming into history: {}", e)))?;

    Ok(final_dir)
}

/// Promote a stored snapshot to current by swapping the pointer file.
pub fn promote(snapshot: &Snapshot, publish_dir: &Path) -> Result<PublishedState> {
    let state = PublishedState {
        snapshot_id: snapshot.id.clone(),
        build_hash: snapshot.descriptor.build_hash.clone(),
        published_at: Utc::now(),
    };
    state.store(publish_dir)?;
    info!(snapshot = %snapshot.id, "published");
    Ok(state)
}
