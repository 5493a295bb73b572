//! Extraction coordination for buildwatch: external tool drivers, the
//! metadata version scan and the structured-document merge.

pub mod coordinator;
pub mod merge;
pub mod process;
pub mod version;

pub use coordinator::{ExtractionCoordinator, ExtractionOutput, VERSION_FILENAME};
pub use process::{SubprocessAssetExtractor, SubprocessDumper, SubprocessUnpacker};
pub use version::{scan_version, VersionScan};
