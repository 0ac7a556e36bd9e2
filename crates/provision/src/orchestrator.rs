//! Resolve-or-acquire orchestration.
//!
//! ```text
//! SEARCHING ──found──────────────────────────────▶ FOUND
//!     │
//!   miss
//!     ▼
//! ACQUIRING ──▶ VALIDATING ──ok──────────────────▶ FOUND
//!     │              │
//!     └──error───────┴──────────────────────────▶ FAILED
//! ```
//!
//! The search phase never touches the network. Nothing is retried: a failed
//! run leaves no cache file behind, so the next activation starts over.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::{AcquisitionMode, ProvisionConfig};
use crate::fetcher::{ArtifactFetcher, HttpFetcher, remove_stale_temp_files};
use crate::locator::{Candidate, CandidateKind, Locator};
use crate::platform::PlatformTag;
use crate::resolver::resolve_url;
use crate::{Error, Result};

/// Orchestrator phases, used for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    /// Probing PATH, bundled and cache tiers
    Searching,
    /// Downloading the release artifact
    Acquiring,
    /// Checking the downloaded file
    Validating,
    /// An executable was selected
    Found,
    /// No executable could be provided
    Failed,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Searching => "searching",
            Self::Acquiring => "acquiring",
            Self::Validating => "validating",
            Self::Found => "found",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How the executable in a [`ProvisionResult`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Found on PATH
    Path,
    /// Shipped with the integration
    Bundled,
    /// Downloaded by an earlier run
    Cached,
    /// Downloaded by this run
    Downloaded,
}

impl From<CandidateKind> for Origin {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::OnPath => Self::Path,
            CandidateKind::Bundled => Self::Bundled,
            CandidateKind::Cached => Self::Cached,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Path => "path",
            Self::Bundled => "bundled",
            Self::Cached => "cached",
            Self::Downloaded => "downloaded",
        };
        f.write_str(name)
    }
}

/// A ready-to-run command for the process launcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResult {
    /// Absolute path (or PATH hit) of the companion binary
    pub executable_path: PathBuf,
    /// Arguments to pass unchanged to the binary
    pub launch_args: Vec<String>,
    /// Directory to start the binary in
    pub working_directory: PathBuf,
    /// Which tier produced the executable
    pub origin: Origin,
    /// Editor-side document filter, passed through from configuration
    pub document_selector: Vec<String>,
}

/// Locates the companion binary, downloading it on a total miss.
pub struct Provisioner {
    config: ProvisionConfig,
    platform: PlatformTag,
    locator: Locator,
    fetcher: Arc<dyn ArtifactFetcher>,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .field("platform", &self.platform)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    /// Create a provisioner for the current host.
    ///
    /// The platform is detected here, once, and reused for every run.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: ProvisionConfig) -> Result<Self> {
        Ok(Self::with_parts(
            config,
            PlatformTag::detect(),
            Locator::from_env(),
            Arc::new(HttpFetcher::new()?),
        ))
    }

    /// Create a provisioner from explicit collaborators.
    #[must_use]
    pub fn with_parts(
        config: ProvisionConfig,
        platform: PlatformTag,
        locator: Locator,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        Self {
            config,
            platform,
            locator,
            fetcher,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// The platform detected at construction.
    #[must_use]
    pub fn platform(&self) -> &PlatformTag {
        &self.platform
    }

    /// Cache path for the pinned version on this platform.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.config.cache_path(self.platform.os)
    }

    /// Candidate locations in priority order.
    ///
    /// The cache tier is omitted when acquisition is disabled.
    #[must_use]
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut candidates = vec![Candidate::on_path(
            self.config.executable_name(self.platform.os),
        )];
        if let Some(bundled) = self.config.bundled_path(self.platform.os) {
            candidates.push(Candidate::bundled(bundled));
        }
        if self.config.acquisition == AcquisitionMode::Download {
            candidates.push(Candidate::cached(self.cache_path()));
        }
        candidates
    }

    /// Download URL for the pinned version on this platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] if the host has no artifact.
    pub fn artifact_url(&self) -> Result<String> {
        resolve_url(
            &self.config.release_base,
            &self.config.artifact_name,
            &self.config.version,
            &self.platform,
        )
    }

    /// Find or acquire the companion binary and build its launch command.
    ///
    /// `workspace_root` becomes the working directory; without one the
    /// current process directory is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] or a fetch-class error when
    /// acquisition fails, and [`Error::NotFound`] when every tier misses and
    /// acquisition is disabled.
    #[instrument(skip(self), fields(version = %self.config.version, platform = %self.platform))]
    pub async fn provision(&self, workspace_root: Option<&Path>) -> Result<ProvisionResult> {
        let working_directory = match workspace_root {
            Some(root) => root.to_path_buf(),
            None => std::env::current_dir().map_err(|e| Error::io(e, None, "current_dir"))?,
        };

        debug!(state = %ProvisionState::Searching, "Searching for executable");
        let candidates = self.candidates();
        if let Some(found) = self.locator.locate(&candidates) {
            info!(
                state = %ProvisionState::Found,
                tier = %found.kind,
                path = ?found.path,
                "Selected ICCheck binary"
            );
            return Ok(self.result(found.path, found.kind.into(), working_directory));
        }

        if self.config.acquisition == AcquisitionMode::BundledOnly {
            let searched = candidates.into_iter().map(|c| c.path).collect();
            let err = Error::not_found(&self.config.artifact_name, searched);
            warn!(state = %ProvisionState::Failed, error = %err, "No executable and downloads disabled");
            return Err(err);
        }

        match self.acquire().await {
            Ok(path) => {
                info!(
                    state = %ProvisionState::Found,
                    path = ?path,
                    "Selected downloaded ICCheck binary"
                );
                Ok(self.result(path, Origin::Downloaded, working_directory))
            }
            Err(err) => {
                warn!(state = %ProvisionState::Failed, error = %err, "Provisioning failed");
                Err(err)
            }
        }
    }

    async fn acquire(&self) -> Result<PathBuf> {
        debug!(state = %ProvisionState::Acquiring, "No usable executable, acquiring");
        let platform = self.platform.clone().supported()?;
        let url = self.artifact_url()?;
        let destination = self.config.cache_path(platform.os);

        let removed = remove_stale_temp_files(
            &destination,
            Duration::from_secs(self.config.stale_temp_after_secs),
        );
        if removed > 0 {
            debug!(removed, "Cleaned up abandoned downloads");
        }

        self.fetcher.fetch(&url, &destination).await?;

        debug!(state = %ProvisionState::Validating, path = ?destination, "Validating download");
        self.locator
            .locate(&[Candidate::cached(&destination)])
            .map(|found| found.path)
            .ok_or_else(|| {
                Error::permission(
                    &destination,
                    "downloaded file is not an executable regular file",
                    None,
                )
            })
    }

    fn result(
        &self,
        executable_path: PathBuf,
        origin: Origin,
        working_directory: PathBuf,
    ) -> ProvisionResult {
        ProvisionResult {
            executable_path,
            launch_args: self.config.effective_launch_args(),
            working_directory,
            origin,
            document_selector: self.config.document_selector.clone(),
        }
    }
}
