//! On-disk layout.
//!
//! ```text
//! <temp>/files/<env>/<type>      raw CDN downloads
//! <temp>/work/<env>/<type>       staging for extraction and archiving
//! <publish>/<type>/<env>/<id>/   permanent snapshot history
//! <publish>/<type>/<env>/CURRENT.json   pointer to the latest snapshot
//! ```
//!
//! All components derive their directories from this one place instead of
//! re-deriving path fragments ad hoc.

use crate::types::BuildType;
use std::path::{Path, PathBuf};

/// Resolved directory layout for one `(environment, build_type)` pair.
#[derive(Debug, Clone)]
pub struct PairPaths {
    /// Raw download area, wiped between passes
    pub files_dir: PathBuf,

    /// Work/staging area, wiped between passes
    pub work_dir: PathBuf,

    /// Snapshot assembly area, wiped between passes; the archiver
    /// materializes the complete snapshot here before promotion
    pub snapshot_dir: PathBuf,

    /// Permanent publish area holding the history and the current pointer
    pub publish_dir: PathBuf,
}

/// Root layout derived from configuration.
#[derive(Debug, Clone)]
pub struct Layout {
    temp_root: PathBuf,
    publish_root: PathBuf,
}

impl Layout {
    pub fn new(temp_root: impl Into<PathBuf>, publish_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
            publish_root: publish_root.into(),
        }
    }

    /// Temp root, cleared at the start of every pass.
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Publish root; snapshots under it are append-only.
    pub fn publish_root(&self) -> &Path {
        &self.publish_root
    }

    /// Directories for one `(environment, build_type)` pair. Environment
    /// names are lowercased for path segments, mirroring the publish URLs.
    pub fn pair(&self, environment: &str, build_type: BuildType) -> PairPaths {
        let env = environment.to_lowercase();
        let ty = build_type.as_segment();
        PairPaths {
            files_dir: self.temp_root.join("files").join(&env).join(ty),
            work_dir: self.temp_root.join("work").join(&env).join(ty),
            snapshot_dir: self.temp_root.join("snapshot").join(&env).join(ty),
            publish_dir: self.publish_root.join(ty).join(&env),
        }
    }
}
