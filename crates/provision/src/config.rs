//! Provisioning configuration.
//!
//! Loaded from an optional TOML file; every key has a default so an empty
//! file (or no file) yields a working configuration. The pinned version is
//! not part of the file format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::platform::Os;
use crate::{Error, Result};

/// Version of the companion binary this build is pinned to.
pub const PINNED_VERSION: &str = "0.7.6";

/// Default executable and artifact name.
pub const DEFAULT_ARTIFACT_NAME: &str = "iccheck";

/// Default release download base.
pub const DEFAULT_RELEASE_BASE: &str = "https://github.com/salab/iccheck/releases/download";

/// Smallest accepted `staleTempAfterSecs`. In-flight downloads of
/// concurrent runs are younger than this.
pub const MIN_STALE_TEMP_AFTER_SECS: u64 = 60;

/// Whether missing binaries may be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcquisitionMode {
    /// Search PATH, bundled and cache tiers, downloading on a total miss
    #[default]
    Download,
    /// Search PATH and bundled tiers only; never touch the network
    BundledOnly,
}

/// Configuration for locating and acquiring the companion binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvisionConfig {
    /// Pinned release version; fixed at build time
    #[serde(skip, default = "default_version")]
    pub version: String,

    /// Executable name, also the artifact name prefix
    pub artifact_name: String,

    /// Base URL under which `v<version>/<artifact>` is published
    pub release_base: String,

    /// Directory holding downloaded binaries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Installation directory the bundled path is relative to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,

    /// Bundled binary location relative to the installation directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundled_path: Option<PathBuf>,

    /// Download policy
    pub acquisition: AcquisitionMode,

    /// Arguments passed to the companion binary
    pub launch_args: Vec<String>,

    /// Clone detection timeout forwarded as `--timeout-seconds`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Document filter for the editor side, passed through untouched
    pub document_selector: Vec<String>,

    /// Age after which leftover temp downloads are removed
    pub stale_temp_after_secs: u64,
}

fn default_version() -> String {
    PINNED_VERSION.to_string()
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            release_base: DEFAULT_RELEASE_BASE.to_string(),
            cache_dir: None,
            install_dir: None,
            bundled_path: None,
            acquisition: AcquisitionMode::default(),
            launch_args: vec!["lsp".to_string()],
            timeout_seconds: None,
            document_selector: vec!["**/*".to_string()],
            stale_temp_after_secs: 3600,
        }
    }
}

impl ProvisionConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is not valid TOML or contains
    /// values of the wrong type.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| {
            Error::configuration_with_help(
                format!("Failed to parse configuration: {e}"),
                "See the README for the list of supported keys",
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a configuration
    /// error if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "read config"))?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<()> {
        if self.artifact_name.trim().is_empty() {
            return Err(Error::configuration("artifactName must not be empty"));
        }
        if self.artifact_name.contains(['/', '\\']) {
            return Err(Error::configuration(format!(
                "artifactName '{}' must be a bare file name",
                self.artifact_name
            )));
        }
        if !self.release_base.starts_with("https://") && !self.release_base.starts_with("http://")
        {
            return Err(Error::configuration_with_help(
                format!("releaseBase '{}' is not an HTTP URL", self.release_base),
                "Use a URL such as https://github.com/<owner>/<repo>/releases/download",
            ));
        }
        if self.stale_temp_after_secs < MIN_STALE_TEMP_AFTER_SECS {
            return Err(Error::configuration_with_help(
                format!(
                    "staleTempAfterSecs {} is below the minimum of {MIN_STALE_TEMP_AFTER_SECS}",
                    self.stale_temp_after_secs
                ),
                "A shorter window would delete downloads that are still in progress",
            ));
        }
        Ok(())
    }

    /// Set the cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, path: PathBuf) -> Self {
        self.cache_dir = Some(path);
        self
    }

    /// Set the installation directory.
    #[must_use]
    pub fn with_install_dir(mut self, path: PathBuf) -> Self {
        self.install_dir = Some(path);
        self
    }

    /// Set the release base URL.
    #[must_use]
    pub fn with_release_base(mut self, base: impl Into<String>) -> Self {
        self.release_base = base.into();
        self
    }

    /// Set the acquisition mode.
    #[must_use]
    pub fn with_acquisition(mut self, mode: AcquisitionMode) -> Self {
        self.acquisition = mode;
        self
    }

    /// Override the pinned version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Executable file name on the given OS.
    #[must_use]
    pub fn executable_name(&self, os: Os) -> String {
        format!("{}{}", self.artifact_name, os.exe_suffix())
    }

    /// Cache directory, defaulting to `~/.cache/iccheck/bin`.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Deterministic cache path for the pinned version.
    #[must_use]
    pub fn cache_path(&self, os: Os) -> PathBuf {
        self.cache_dir().join(format!(
            "{}-{}{}",
            self.artifact_name,
            self.version,
            os.exe_suffix()
        ))
    }

    /// Bundled binary path, resolved against the installation directory.
    ///
    /// Returns `None` when no installation directory can be determined.
    #[must_use]
    pub fn bundled_path(&self, os: Os) -> Option<PathBuf> {
        let install_dir = self.install_dir.clone().or_else(default_install_dir)?;
        let relative = self
            .bundled_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("bin").join(self.executable_name(os)));
        Some(install_dir.join(relative))
    }

    /// Full argument list for the companion binary.
    #[must_use]
    pub fn effective_launch_args(&self) -> Vec<String> {
        let mut args = self.launch_args.clone();
        if let Some(secs) = self.timeout_seconds {
            args.push("--timeout-seconds".to_string());
            args.push(secs.to_string());
        }
        args
    }
}

/// Default cache directory for downloaded binaries.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("iccheck").join("bin"))
        .unwrap_or_else(std::env::temp_dir)
}

fn default_install_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
