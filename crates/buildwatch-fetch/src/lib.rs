//! Asset acquisition for buildwatch.
//!
//! Given a build's base download URL, acquires the full raw asset set via a
//! manifest-driven incremental download or, when no manifest is advertised,
//! an ordered fallback chain (installer unpack, then archive unpack).

pub mod download;
pub mod manifest;
pub mod strategy;

pub use download::AssetDownloader;
pub use manifest::{ChecksumManifest, ManifestEntry, MANIFEST_FILENAME};
pub use strategy::{acquire, AcquiredAssets, FetchStrategy};
