//! Host platform identification.
//!
//! Maps the running host's OS name and CPU architecture onto the naming
//! scheme used by ICCheck release artifacts (`windows|linux|darwin`,
//! `amd64|arm64`). Host strings vary by vendor, so matching is permissive.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows
    Windows,
    /// Linux
    Linux,
    /// macOS
    Darwin,
    /// No release artifact exists
    Unsupported,
}

impl Os {
    /// Classify an OS name by case-insensitive substring match.
    ///
    /// `mac`/`darwin` are checked before `win`, since "darwin" contains "win".
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("mac") || name.contains("darwin") {
            Self::Darwin
        } else if name.contains("win") {
            Self::Windows
        } else if name.contains("nux") {
            Self::Linux
        } else {
            Self::Unsupported
        }
    }

    /// Release artifact token for this OS, if one exists.
    #[must_use]
    pub fn artifact_token(self) -> Option<&'static str> {
        match self {
            Self::Windows => Some("windows"),
            Self::Linux => Some("linux"),
            Self::Darwin => Some("darwin"),
            Self::Unsupported => None,
        }
    }

    /// Suffix appended to executable file names on this OS.
    #[must_use]
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::Darwin | Self::Unsupported => "",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_token().unwrap_or("unsupported"))
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86-64
    Amd64,
    /// 64-bit ARM
    Arm64,
    /// No release artifact exists
    Unsupported,
}

impl Arch {
    /// Normalize an architecture alias.
    ///
    /// `x86_64`, `amd64` and `x64` map to [`Arch::Amd64`]; `aarch64` and
    /// anything starting with `arm64` map to [`Arch::Arm64`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        match name.as_str() {
            "x86_64" | "amd64" | "x64" => Self::Amd64,
            "aarch64" => Self::Arm64,
            other if other.starts_with("arm64") => Self::Arm64,
            _ => Self::Unsupported,
        }
    }

    /// Release artifact token for this architecture, if one exists.
    #[must_use]
    pub fn artifact_token(self) -> Option<&'static str> {
        match self {
            Self::Amd64 => Some("amd64"),
            Self::Arm64 => Some("arm64"),
            Self::Unsupported => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact_token().unwrap_or("unsupported"))
    }
}

/// Platform tag combining OS and architecture.
///
/// The raw host strings are kept so that an unsupported platform can be
/// reported exactly as the environment described it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformTag {
    /// Normalized OS family
    pub os: Os,
    /// Normalized architecture
    pub arch: Arch,
    #[serde(skip)]
    raw_os: String,
    #[serde(skip)]
    raw_arch: String,
}

impl PlatformTag {
    /// Build a tag from host-reported OS and architecture names.
    #[must_use]
    pub fn from_names(os_name: &str, arch_name: &str) -> Self {
        Self {
            os: Os::from_name(os_name),
            arch: Arch::from_name(arch_name),
            raw_os: os_name.to_string(),
            raw_arch: arch_name.to_string(),
        }
    }

    /// Detect the current host, keeping unsupported components as-is.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Identify the current host, failing if no release artifact matches it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] when either the OS or the
    /// architecture cannot be mapped.
    pub fn identify() -> Result<Self> {
        Self::detect().supported()
    }

    /// Confirm that both components map to a release artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] carrying the raw host strings.
    pub fn supported(self) -> Result<Self> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(Error::unsupported_platform(&self.raw_os, &self.raw_arch))
        }
    }

    /// Whether both OS and architecture map to a release artifact.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.os != Os::Unsupported && self.arch != Arch::Unsupported
    }

    /// Host-reported OS name this tag was built from.
    #[must_use]
    pub fn raw_os(&self) -> &str {
        &self.raw_os
    }

    /// Host-reported architecture name this tag was built from.
    #[must_use]
    pub fn raw_arch(&self) -> &str {
        &self.raw_arch
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}
