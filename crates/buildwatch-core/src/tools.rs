//! Capability seams for the external tools the pipeline shells out to.
//!
//! The traits live here so that the crates invoking a tool do not depend on
//! the crate providing the subprocess implementation, and so tests can
//! substitute fakes without spawning real processes.

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Unpacks a downloaded installer binary into a directory tree.
#[async_trait]
pub trait LauncherUnpacker: Send + Sync {
    /// Run the unpacker over `installer`, writing under `out_dir`. Returns
    /// the root directory of the unpacked assets.
    async fn unpack(&self, installer: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Parses proprietary asset bundles into typed sub-resources.
///
/// The output is a fixed directory contract: type-named subdirectories
/// (`TextAsset/`, images, audio, script metadata) under `out_dir`. The
/// pipeline only relies on that layout, never on the parsing itself.
#[async_trait]
pub trait AssetExtractor: Send + Sync {
    async fn extract(&self, bundle_root: &Path, out_dir: &Path) -> Result<()>;
}

/// Dumps type/method layout information from a compiled binary plus its
/// metadata file.
#[async_trait]
pub trait MetadataDumper: Send + Sync {
    async fn dump(&self, binary: &Path, metadata: &Path, out_dir: &Path) -> Result<()>;
}
