//! Download of the yearly PRF accident archives.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Placeholder substituted by the year in [`DatatranSource::url_template`].
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// Where the archive for each year comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatatranSource {
    /// URL with a `{year}` placeholder, used when no per-year URL is set
    #[serde(default)]
    pub url_template: Option<String>,

    /// Explicit URL per year; takes precedence over the template
    #[serde(default)]
    pub urls: BTreeMap<i32, String>,

    /// Directory holding `datatran<YEAR>.zip` files, checked before downloading
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
}

impl DatatranSource {
    /// File name of the archive for a year.
    pub fn archive_name(year: i32) -> String {
        format!("datatran{year}.zip")
    }

    /// Resolve the download URL for a year.
    pub fn url_for(&self, year: i32) -> Option<String> {
        self.urls.get(&year).cloned().or_else(|| {
            self.url_template
                .as_ref()
                .map(|template| template.replace(YEAR_PLACEHOLDER, &year.to_string()))
        })
    }

    /// Local archive for a year, when one exists in `archive_dir`.
    pub fn local_archive(&self, year: i32) -> Option<PathBuf> {
        self.archive_dir
            .as_ref()
            .map(|dir| dir.join(Self::archive_name(year)))
            .filter(|path| path.is_file())
    }
}

/// HTTP client for PRF archives.
#[derive(Debug, Clone)]
pub struct DatatranClient {
    http: reqwest::Client,
}

impl DatatranClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("transito/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// Download `url` into `dest`.
    ///
    /// The body is written next to `dest` and renamed into place so an
    /// interrupted download never leaves a truncated archive behind.
    /// Returns the number of bytes written.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {url}");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        store_archive(&bytes, dest).await?;

        debug!(bytes = bytes.len(), path = %dest.display(), "archive stored");
        Ok(bytes.len() as u64)
    }

    /// Make the archive for `year` available under `download_dir`.
    ///
    /// A local archive in the source's `archive_dir` wins, then an archive
    /// already present in `download_dir` (unless `refresh`), then a download.
    pub async fn fetch_archive(
        &self,
        source: &DatatranSource,
        year: i32,
        download_dir: &Path,
        refresh: bool,
    ) -> Result<PathBuf> {
        if let Some(local) = source.local_archive(year) {
            debug!(year, path = %local.display(), "using local archive");
            return Ok(local);
        }

        let dest = download_dir.join(DatatranSource::archive_name(year));
        if !refresh && dest.is_file() {
            debug!(year, path = %dest.display(), "using previously downloaded archive");
            return Ok(dest);
        }

        let url = source.url_for(year).ok_or(DataError::NoSource { year })?;
        self.download(&url, &dest).await?;
        Ok(dest)
    }
}

/// Write `bytes` to `dest` through a temporary sibling file.
///
/// The temporary file is removed when either the write or the rename fails.
async fn store_archive(bytes: &[u8], dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = dest.with_extension("zip.tmp");
    let stored: std::io::Result<()> = async {
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, dest).await
    }
    .await;

    if let Err(e) = stored {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            debug!(path = %tmp_path.display(), "temporary archive not removed: {cleanup}");
        }
        return Err(e.into());
    }
    Ok(())
}
