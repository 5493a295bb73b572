//! Asset acquisition strategies.
//!
//! Strategies are attempted in fixed priority order, stopping at the first
//! success: manifest-driven incremental download, installer unpack, archive
//! unpack. The order is a specified contract; do not reorder. A strategy
//! either acquires the complete asset set or fails as a whole; there is no
//! partial success.

use crate::download::AssetDownloader;
use crate::manifest::{ChecksumManifest, MANIFEST_FILENAME};
use buildwatch_core::tools::LauncherUnpacker;
use buildwatch_core::{BuildDescriptor, Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which strategy produced the assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    Manifest,
    Installer,
    Archive,
}

/// The acquired raw asset set.
#[derive(Debug)]
pub struct AcquiredAssets {
    /// Root directory containing the build's files
    pub root: PathBuf,

    /// Strategy that succeeded
    pub strategy: FetchStrategy,
}

/// Acquire the full asset set for a build under `files_dir`.
///
/// Writes only under `files_dir`. Returns a fetch error once every strategy
/// is exhausted; the caller must then abort the run without touching the
/// published state.
pub async fn acquire(
    downloader: &AssetDownloader,
    unpacker: Option<&dyn LauncherUnpacker>,
    descriptor: &BuildDescriptor,
    files_dir: &Path,
) -> Result<AcquiredAssets> {
    let build_url = descriptor.build_url();
    let mut failures: Vec<String> = Vec::new();

    match fetch_via_manifest(downloader, &build_url, files_dir).await {
        Ok(root) => {
            return Ok(AcquiredAssets {
                root,
                strategy: FetchStrategy::Manifest,
            })
        }
        Err(e) => {
            warn!(error = %e, "manifest strategy failed");
            failures.push(format!("manifest: {}", e));
        }
    }

    match fetch_via_installer(downloader, unpacker, descriptor, &build_url, files_dir).await {
        Ok(root) => {
            return Ok(AcquiredAssets {
                root,
                strategy: FetchStrategy::Installer,
            })
        }
        Err(e) => {
            warn!(error = %e, "installer strategy failed");
            failures.push(format!("installer: {}", e));
        }
    }

    match fetch_via_archive(downloader, descriptor, &build_url, files_dir).await {
        Ok(root) => {
            return Ok(AcquiredAssets {
                root,
                strategy: FetchStrategy::Archive,
            })
        }
        Err(e) => {
            warn!(error = %e, "archive strategy failed");
            failures.push(format!("archive: {}", e));
        }
    }

    Err(Error::fetch(build_url, failures.join("; ")))
}

/// Strategy 1: fetch the checksum manifest and download every listed file,
/// preserving the manifest's relative directory structure. Any single file's
/// failure aborts the whole strategy.
async fn fetch_via_manifest(
    downloader: &AssetDownloader,
    build_url: &str,
    files_dir: &Path,
) -> Result<PathBuf> {
    let manifest_url = format!("{}/{}", build_url, MANIFEST_FILENAME);
    let manifest_json = downloader.fetch_text(&manifest_url).await?;
    let manifest = ChecksumManifest::parse(&manifest_json)?;

    fs::create_dir_all(files_dir)?;
    fs::write(files_dir.join(MANIFEST_FILENAME), &manifest_json)?;

    info!(files = manifest.files.len(), "downloading build assets");
    for entry in &manifest.files {
        let url = format!("{}/{}", build_url, entry.file);
        let dest = files_dir.join(&entry.file);
        downloader.download_to(&url, &dest, true).await?;
    }

    Ok(files_dir.to_path_buf())
}

/// Strategy 2: download the single installer binary and hand it to the
/// external unpacker; the unpacker's declared output directory is the result.
async fn fetch_via_installer(
    downloader: &AssetDownloader,
    unpacker: Option<&dyn LauncherUnpacker>,
    descriptor: &BuildDescriptor,
    build_url: &str,
    files_dir: &Path,
) -> Result<PathBuf> {
    let unpacker = unpacker.ok_or_else(|| Error::fetch(build_url, "no unpacker configured"))?;

    let installer_url = format!("{}.exe", build_url);
    let installer_path = files_dir.join(format!("{}.exe", descriptor.build_id));
    downloader
        .download_to(&installer_url, &installer_path, false)
        .await?;

    let out_dir = files_dir.join("unpacked");
    fs::create_dir_all(&out_dir)?;
    unpacker.unpack(&installer_path, &out_dir).await
}

/// Strategy 3: download the single compressed archive and extract it in
/// place.
async fn fetch_via_archive(
    downloader: &AssetDownloader,
    descriptor: &BuildDescriptor,
    build_url: &str,
    files_dir: &Path,
) -> Result<PathBuf> {
    let archive_url = format!("{}.tar.gz", build_url);
    let archive_path = files_dir.join(format!("{}.tar.gz", descriptor.build_id));
    downloader
        .download_to(&archive_url, &archive_path, false)
        .await?;

    let decoder = GzDecoder::new(File::open(&archive_path)?);
    let mut archive = tar::Archive::new(decoder);
    archive
        .unpack(files_dir)
        .map_err(|e| Error::fetch(&archive_url, format!("extracting: {}", e)))?;
    fs::remove_file(&archive_path)?;

    Ok(files_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use buildwatch_core::config::NetworkConfig;
    use buildwatch_core::BuildType;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn descriptor(server: &MockServer) -> BuildDescriptor {
        BuildDescriptor {
            environment: "Testing".to_string(),
            build_type: BuildType::Client,
            build_id: "game-win-64".to_string(),
            build_hash: "abc123".to_string(),
            build_version: "v".to_string(),
            cdn_base_url: format!("{}/build-release/", server.uri()),
        }
    }

    struct RecordingUnpacker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LauncherUnpacker for RecordingUnpacker {
        async fn unpack(&self, installer: &Path, out_dir: &Path) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let data = fs::read(installer)?;
            fs::write(out_dir.join("payload.txt"), data)?;
            Ok(out_dir.to_path_buf())
        }
    }

    #[tokio::test]
    async fn manifest_strategy_downloads_all_files_with_structure() {
        let server = MockServer::start().await;
        let manifest = r#"{"files": [
            {"file": "resources.assets"},
            {"file": "data/global-metadata.dat"},
            {"file": "data/level0"}
        ]}"#;
        Mock::given(method("GET"))
            .and(path("/build-release/abc123/game-win-64/checksum.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(manifest))
            .mount(&server)
            .await;
        for rel in ["resources.assets", "data/global-metadata.dat", "data/level0"] {
            Mock::given(method("GET"))
                .and(path(format!(
                    "/build-release/abc123/game-win-64/{}.gz",
                    rel
                )))
                .respond_with(
                    ResponseTemplate::new(200).set_body_bytes(gzip(rel.as_bytes())),
                )
                .mount(&server)
                .await;
        }

        let dir = TempDir::new().unwrap();
        let downloader = AssetDownloader::new(&NetworkConfig::default()).unwrap();
        let acquired = acquire(&downloader, None, &descriptor(&server), dir.path())
            .await
            .unwrap();

        assert_eq!(acquired.strategy, FetchStrategy::Manifest);
        assert_eq!(acquired.root, dir.path());
        assert_eq!(
            fs::read(dir.path().join("resources.assets")).unwrap(),
            b"resources.assets"
        );
        assert_eq!(
            fs::read(dir.path().join("data/global-metadata.dat")).unwrap(),
            b"data/global-metadata.dat"
        );
        assert_eq!(fs::read(dir.path().join("data/level0")).unwrap(), b"data/level0");
    }

    #[tokio::test]
    async fn one_missing_file_fails_the_manifest_strategy() {
        let server = MockServer::start().await;
        let manifest = r#"{"files": [{"file": "a.txt"}, {"file": "b.txt"}]}"#;
        Mock::given(method("GET"))
            .and(path("/build-release/abc123/game-win-64/checksum.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(manifest))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/build-release/abc123/game-win-64/a.txt.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"a")))
            .mount(&server)
            .await;
        // b.txt.gz is not mounted: 404

        let dir = TempDir::new().unwrap();
        let downloader = AssetDownloader::new(&NetworkConfig::default()).unwrap();
        let result = acquire(&downloader, None, &descriptor(&server), dir.path()).await;

        // no installer or archive mocks either, so the whole acquisition fails
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn falls_back_to_installer_when_manifest_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/build-release/abc123/game-win-64.exe"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MZ-installer".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = AssetDownloader::new(&NetworkConfig::default()).unwrap();
        let unpacker = RecordingUnpacker {
            calls: AtomicUsize::new(0),
        };
        let acquired = acquire(
            &downloader,
            Some(&unpacker),
            &descriptor(&server),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(acquired.strategy, FetchStrategy::Installer);
        assert_eq!(unpacker.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            fs::read(acquired.root.join("payload.txt")).unwrap(),
            b"MZ-installer"
        );
    }

    #[tokio::test]
    async fn falls_back_to_archive_as_last_resort() {
        let server = MockServer::start().await;

        // build a tar.gz with one file
        let mut tar_bytes = Vec::new();
        {
            let encoder = GzEncoder::new(&mut tar_bytes, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let mut header = tar::Header::new_gnu();
            header.set_size(5);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "inner/file.txt", &b"hello"[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }
        Mock::given(method("GET"))
            .and(path("/build-release/abc123/game-win-64.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(tar_bytes))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let downloader = AssetDownloader::new(&NetworkConfig::default()).unwrap();
        let acquired = acquire(&downloader, None, &descriptor(&server), dir.path())
            .await
            .unwrap();

        assert_eq!(acquired.strategy, FetchStrategy::Archive);
        assert_eq!(
            fs::read_to_string(dir.path().join("inner/file.txt")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn all_strategies_exhausted_is_a_fetch_error() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let downloader = AssetDownloader::new(&NetworkConfig::default()).unwrap();

        let result = acquire(&downloader, None, &descriptor(&server), dir.path()).await;
        match result {
            Err(Error::Fetch { message, .. }) => {
                assert!(message.contains("manifest:"));
                assert!(message.contains("installer:"));
                assert!(message.contains("archive:"));
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }
}
