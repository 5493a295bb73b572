//! Build gate.
//!
//! The idempotence guard of the pipeline: decides from the freshly fetched
//! descriptor and the last published hash whether a run is warranted. Runs
//! before any download.

use buildwatch_core::{BuildDescriptor, GateDecision, PublishedState, SkipReason};
use tracing::debug;

/// Decide whether the pipeline should run for this descriptor.
///
/// An empty descriptor hash means the build type has no active build and is
/// reported as [`SkipReason::Unavailable`] so callers log rather than alarm.
/// A hash equal to the last published one (including both being absent)
/// short-circuits as [`SkipReason::NoChange`].
pub fn decide(descriptor: &BuildDescriptor, last: Option<&PublishedState>) -> GateDecision {
    if !descriptor.has_build() {
        return GateDecision::Skip(SkipReason::Unavailable);
    }

    match last {
        Some(state) if state.build_hash == descriptor.build_hash => {
            debug!(hash = %descriptor.build_hash, "hash matches published state");
            GateDecision::Skip(SkipReason::NoChange)
        }
        _ => GateDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildwatch_core::{BuildType, SnapshotId};
    use chrono::Utc;

    fn descriptor(hash: &str) -> BuildDescriptor {
        BuildDescriptor {
            environment: "Testing".to_string(),
            build_type: BuildType::Client,
            build_id: "game-win-64".to_string(),
            build_hash: hash.to_string(),
            build_version: "v".to_string(),
            cdn_base_url: "https://cdn.example.com/".to_string(),
        }
    }

    fn published(hash: &str) -> PublishedState {
        PublishedState {
            snapshot_id: SnapshotId::derive(hash, Utc::now()),
            build_hash: hash.to_string(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn equal_hash_skips_as_no_change() {
        let state = published("abc123");
        assert_eq!(
            decide(&descriptor("abc123"), Some(&state)),
            GateDecision::Skip(SkipReason::NoChange)
        );
    }

    #[test]
    fn different_hash_proceeds() {
        let state = published("abc123");
        assert_eq!(
            decide(&descriptor("def456"), Some(&state)),
            GateDecision::Proceed
        );
    }

    #[test]
    fn first_build_proceeds() {
        assert_eq!(decide(&descriptor("abc123"), None), GateDecision::Proceed);
    }

    #[test]
    fn empty_hash_is_unavailable_even_without_history() {
        assert_eq!(
            decide(&descriptor(""), None),
            GateDecision::Skip(SkipReason::Unavailable)
        );
    }

    #[test]
    fn empty_hash_is_unavailable_with_history() {
        let state = published("abc123");
        assert_eq!(
            decide(&descriptor(""), Some(&state)),
            GateDecision::Skip(SkipReason::Unavailable)
        );
    }
}
