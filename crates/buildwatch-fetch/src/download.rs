//! Single-asset CDN downloads.
//!
//! Assets are streamed to disk chunk by chunk. Most build assets are stored
//! on the CDN as gzip archives next to their logical path (`<path>.gz`); the
//! downloader fetches the archive and decompresses it transparently so
//! callers only ever see the logical file.

use buildwatch_core::config::NetworkConfig;
use buildwatch_core::{Error, Result};
use flate2::read::GzDecoder;
use futures::StreamExt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// HTTP downloader for build assets.
pub struct AssetDownloader {
    client: reqwest::Client,
}

impl AssetDownloader {
    /// Create a downloader with the configured HTTP settings.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(std::time::Duration::from_secs(network.http_timeout_secs))
            .build()
            .map_err(|e| Error::fetch("", format!("building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (used by tests and the webhook notifier).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch a small text resource (e.g. the checksum manifest).
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let url = encode_spaces(url);
        debug!(%url, "fetching");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch(&url, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::fetch(&url, format!("status {}", response.status())));
        }
        response
            .text()
            .await
            .map_err(|e| Error::fetch(&url, e.to_string()))
    }

    /// Stream `url` to `dest`, creating parent directories.
    ///
    /// With `gzipped` the URL is fetched with a `.gz` suffix, written next to
    /// `dest`, decompressed into `dest` and the archive removed. The CDN
    /// stores every file as a per-file gzip archive.
    pub async fn download_to(&self, url: &str, dest: &Path, gzipped: bool) -> Result<()> {
        let fetch_url = if gzipped {
            format!("{}.gz", url)
        } else {
            url.to_string()
        };
        let fetch_url = encode_spaces(&fetch_url);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let raw_dest = if gzipped {
            let mut p = dest.as_os_str().to_owned();
            p.push(".gz");
            std::path::PathBuf::from(p)
        } else {
            dest.to_path_buf()
        };

        debug!(url = %fetch_url, dest = %raw_dest.display(), "downloading");

        let response = self
            .client
            .get(&fetch_url)
            .send()
            .await
            .map_err(|e| Error::fetch(&fetch_url, e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::fetch(
                &fetch_url,
                format!("status {}", response.status()),
            ));
        }

        let mut file = BufWriter::new(File::create(&raw_dest)?);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::fetch(&fetch_url, e.to_string()))?;
            file.write_all(&chunk)?;
        }
        file.flush()?;
        drop(file);

        if gzipped {
            debug!(archive = %raw_dest.display(), "decompressing");
            let mut decoder = GzDecoder::new(File::open(&raw_dest)?);
            let mut out = BufWriter::new(File::create(dest)?);
            std::io::copy(&mut decoder, &mut out)
                .map_err(|e| Error::fetch(&fetch_url, format!("gunzip: {}", e)))?;
            out.flush()?;
            fs::remove_file(&raw_dest)?;
        }

        Ok(())
    }
}

/// CDN paths occasionally contain spaces; percent-encode them so reqwest
/// accepts the URL as served.
fn encode_spaces(url: &str) -> String {
    url.replace(' ', "%20")
}
