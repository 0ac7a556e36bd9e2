//! Streaming download of release artifacts into the cache.
//!
//! The response body is written to a temporary sibling of the destination and
//! renamed into place only after the whole body has arrived. Concurrent
//! readers of the destination therefore see either nothing or a complete
//! file. Dropping the temporary handle on any early return (including the
//! fetch future being cancelled) deletes the partial download.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::permissions::mark_executable;
use crate::{Error, Result};

/// Suffix of in-flight download files.
pub const TEMP_SUFFIX: &str = ".part";

/// Downloads an artifact to a destination path.
///
/// Implementations must never leave a partially written file at
/// `destination`, and must leave a complete one executable. The provisioner
/// does not change permissions after a fetch.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Download `url` to `destination`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] on connection, HTTP status, stream or
    /// filesystem failure.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Fetcher backed by an HTTPS client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with a client identifying this crate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("iccheck-launcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::configuration(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    /// Create a fetcher around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        let (dir, file_name) = split_destination(url, destination)?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::fetch_with_source(url, "cannot create cache directory", e))?;

        let temp = tempfile::Builder::new()
            .prefix(&temp_prefix(file_name))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| Error::fetch_with_source(url, "cannot create temporary file", e))?;
        let (std_file, temp_path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        info!(%url, destination = ?destination, "Downloading ICCheck binary");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch_with_source(url, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {status}")));
        }

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        // A body shorter than Content-Length surfaces as a stream error.
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::fetch_with_source(url, "download interrupted", e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::fetch_with_source(url, "cannot write download", e))?;
            written += chunk.len() as u64;
        }

        if written == 0 {
            return Err(Error::fetch(url, "empty response body"));
        }

        file.flush()
            .await
            .map_err(|e| Error::fetch_with_source(url, "cannot flush download", e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::fetch_with_source(url, "cannot sync download", e))?;
        drop(file);

        // Mode is set before the rename so the destination never appears
        // without its execute bit.
        mark_executable(&temp_path)?;

        temp_path.persist(destination).map_err(|e| {
            Error::fetch_with_source(url, "cannot move download into place", e.error)
        })?;

        debug!(bytes = written, destination = ?destination, "Download complete");
        Ok(())
    }
}

fn split_destination<'a>(url: &str, destination: &'a Path) -> Result<(&'a Path, &'a str)> {
    let dir = destination
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = destination
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            Error::fetch(
                url,
                format!("invalid destination path {}", destination.display()),
            )
        })?;
    Ok((dir, file_name))
}

fn temp_prefix(file_name: &str) -> String {
    format!(".{file_name}.")
}

/// Remove abandoned temporary downloads for `destination`.
///
/// Only files older than `max_age` are touched, so a download that another
/// process is still writing survives. Failures are logged and skipped.
/// Returns the number of files removed.
pub fn remove_stale_temp_files(destination: &Path, max_age: Duration) -> usize {
    let (Some(dir), Some(file_name)) = (
        destination.parent(),
        destination.file_name().and_then(|name| name.to_str()),
    ) else {
        return 0;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let prefix = temp_prefix(file_name);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&prefix) || !name.ends_with(TEMP_SUFFIX) {
            continue;
        }

        let age = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .ok()
            .map(|modified| now.duration_since(modified).unwrap_or_default());
        if age.is_none_or(|age| age < max_age) {
            continue;
        }

        let path = entry.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(?path, "Removed stale temporary download");
                removed += 1;
            }
            Err(e) => warn!(?path, error = %e, "Failed to remove stale temporary download"),
        }
    }

    removed
}
