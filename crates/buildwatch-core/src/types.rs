//! Domain types shared across the pipeline.
//!
//! A [`BuildDescriptor`] is produced fresh on every poll and never persisted.
//! A [`Snapshot`] is created once per successful run and is immutable
//! afterwards. [`PublishedState`] lives in a pointer file next to the snapshot
//! history and is replaced only by the publish step, and only atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The two tracked build channels of the upstream application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Client,
    Launcher,
}

impl BuildType {
    /// All build types, in the fixed enumeration order the scheduler uses.
    pub const ALL: [BuildType; 2] = [BuildType::Client, BuildType::Launcher];

    /// Lowercase path segment used in the temp and publish layouts.
    pub fn as_segment(&self) -> &'static str {
        match self {
            BuildType::Client => "client",
            BuildType::Launcher => "launcher",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Client => write!(f, "Client"),
            BuildType::Launcher => write!(f, "Launcher"),
        }
    }
}

/// One released build of the tracked application, as advertised by the
/// app-settings endpoint for a given environment.
///
/// `build_hash` is the sole novelty signal: two descriptors with equal hash
/// for the same `(environment, build_type)` are the same build regardless of
/// the other fields. An empty hash means the build type has no active build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Environment name (e.g. "Production", "Testing")
    pub environment: String,

    /// Which build channel this descriptor is for
    pub build_type: BuildType,

    /// Upstream build identifier (e.g. an installer or package name)
    pub build_id: String,

    /// Content hash distributed by the source; empty when unavailable
    pub build_hash: String,

    /// Upstream version string (opaque, informational)
    pub build_version: String,

    /// Base URL of the CDN hosting this build's assets
    pub cdn_base_url: String,
}

impl BuildDescriptor {
    /// Whether the source advertises an active build for this type.
    pub fn has_build(&self) -> bool {
        !self.build_hash.is_empty()
    }

    /// Root URL of this build's asset set: `<cdn>/<hash>/<id>`.
    pub fn build_url(&self) -> String {
        let cdn = self.cdn_base_url.trim_end_matches('/');
        format!("{}/{}/{}", cdn, self.build_hash, self.build_id)
    }
}

/// Identifier of an archived snapshot, used as its directory name in the
/// publish history.
///
/// Derived from the build hash; falls back to a UTC timestamp when no hash is
/// meaningful. Always a single safe path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Derive an id from a build hash, or from `now` when the hash is empty
    /// or sanitizes to nothing usable.
    pub fn derive(build_hash: &str, now: DateTime<Utc>) -> Self {
        let sanitized: String = build_hash
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if sanitized.is_empty() {
            Self(now.format("%Y%m%d%H%M%S").to_string())
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of a fully materialized snapshot, stored as `snapshot.json`
/// inside the snapshot directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Identifier, also the history directory name
    pub id: SnapshotId,

    /// When the snapshot finished archiving
    pub created_at: DateTime<Utc>,

    /// Snapshot directory root (not serialized; rebound on load)
    #[serde(skip)]
    pub root: PathBuf,

    /// The descriptor this snapshot was built from
    pub descriptor: BuildDescriptor,

    /// Version string recovered from the binary metadata, when unambiguous
    pub extracted_version: Option<String>,
}

/// Aggregate change counts between two snapshots. Informational only; feeds
/// the notifier, never any control flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub files_added: usize,
    pub files_removed: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{} -{} files, +{} -{} lines",
            self.files_added, self.files_removed, self.lines_added, self.lines_removed
        )
    }
}

/// Why the gate told the scheduler not to run the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source advertises no build for this type (empty hash)
    Unavailable,
    /// The advertised hash equals the last published hash
    NoChange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unavailable => write!(f, "no build available"),
            SkipReason::NoChange => write!(f, "build hash unchanged"),
        }
    }
}

/// Outcome of the build gate, decided before any download happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip(SkipReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn build_url_joins_cdn_hash_and_id() {
        let descriptor = BuildDescriptor {
            environment: "Production".to_string(),
            build_type: BuildType::Client,
            build_id: "game-win-64".to_string(),
            build_hash: "a1c8d9ae".to_string(),
            build_version: "deadbeef".to_string(),
            cdn_base_url: "https://cdn.example.com/build-release/".to_string(),
        };
        assert_eq!(
            descriptor.build_url(),
            "https://cdn.example.com/build-release/a1c8d9ae/game-win-64"
        );
    }

    #[test]
    fn snapshot_id_uses_hash_when_present() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let id = SnapshotId::derive("a1c8d9ae2a25", now);
        assert_eq!(id.as_str(), "a1c8d9ae2a25");
    }

    #[test]
    fn snapshot_id_falls_back_to_timestamp() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let id = SnapshotId::derive("", now);
        assert_eq!(id.as_str(), "20240501120000");
    }

    #[test]
    fn snapshot_id_strips_path_characters() {
        let now = Utc::now();
        let id = SnapshotId::derive("../../etc/passwd", now);
        assert_eq!(id.as_str(), "etcpasswd");
    }

    #[test]
    fn fully_filtered_hash_falls_back_to_timestamp() {
        // a hash of nothing but path characters must never yield an empty
        // id, which would alias the pair's publish root
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let id = SnapshotId::derive("..", now);
        assert_eq!(id.as_str(), "20240501120000");
        let id = SnapshotId::derive("../..", now);
        assert_eq!(id.as_str(), "20240501120000");
    }

    #[test]
    fn empty_hash_means_no_build() {
        let descriptor = BuildDescriptor {
            environment: "Testing".to_string(),
            build_type: BuildType::Launcher,
            build_id: String::new(),
            build_hash: String::new(),
            build_version: String::new(),
            cdn_base_url: String::new(),
        };
        assert!(!descriptor.has_build());
    }
}
