//! Published-state pointer files.
//!
//! For each `(environment, build_type)` pair the publish area holds a single
//! `CURRENT.json` next to the snapshot history. It records the last
//! successfully published build hash and the snapshot it points at, and is
//! only ever replaced via write-temp-then-rename so a reader (or a crashed
//! process) always sees either the old complete state or the new one.

use crate::error::{Error, Result};
use crate::types::SnapshotId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name of the pointer file inside `publish/<type>/<env>/`.
pub const CURRENT_POINTER: &str = "CURRENT.json";

/// The last successfully published build for one `(environment, build_type)`
/// pair. Mutated only by the publish step, and only as the final action of a
/// fully successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedState {
    /// Snapshot directory the "current" designation points at
    pub snapshot_id: SnapshotId,

    /// Build hash of that snapshot; the gate compares against this
    pub build_hash: String,

    /// When the pointer was swapped
    pub published_at: DateTime<Utc>,
}

impl PublishedState {
    /// Load the pointer file from a pair's publish directory.
    ///
    /// Returns `Ok(None)` when no build has ever been published for the pair.
    pub fn load(pair_publish_dir: &Path) -> Result<Option<Self>> {
        let pointer = pair_publish_dir.join(CURRENT_POINTER);
        if !pointer.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&pointer)?;
        let state: PublishedState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    /// Atomically replace the pointer file in a pair's publish directory.
    ///
    /// The state is serialized to `CURRENT.json.tmp` and renamed over the
    /// pointer, so a crash between the two steps leaves the previous pointer
    /// intact.
    pub fn store(&self, pair_publish_dir: &Path) -> Result<()> {
        fs::create_dir_all(pair_publish_dir)
            .map_err(|e| Error::publish(format!("creating {:?}: {}", pair_publish_dir, e)))?;

        let pointer = pair_publish_dir.join(CURRENT_POINTER);
        let staged = pair_publish_dir.join(format!("{}.tmp", CURRENT_POINTER));

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&staged, json)
            .map_err(|e| Error::publish(format!("writing {:?}: {}", staged, e)))?;
        fs::rename(&staged, &pointer)
            .map_err(|e| Error::publish(format!("swapping {:?}: {}", pointer, e)))?;

        Ok(())
    }

    /// Resolve the snapshot directory the pointer designates.
    pub fn snapshot_dir(&self, pair_publish_dir: &Path) -> std::path::PathBuf {
        pair_publish_dir.join(self.snapshot_id.as_str())
    }
}
