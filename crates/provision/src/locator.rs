//! Executable lookup across the fixed candidate tiers.
//!
//! Candidates are probed strictly in order and the first usable one wins:
//! PATH (local development overrides), the bundled binary, then the cache
//! file for the pinned version.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Where a candidate executable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    /// Searched for by name in every PATH directory
    OnPath,
    /// Shipped alongside the integration
    Bundled,
    /// Downloaded by an earlier run for the pinned version
    Cached,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnPath => write!(f, "PATH"),
            Self::Bundled => write!(f, "bundled"),
            Self::Cached => write!(f, "cache"),
        }
    }
}

/// A location to probe for a usable executable.
///
/// For [`CandidateKind::OnPath`] the path is a bare executable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Tier this candidate belongs to
    pub kind: CandidateKind,
    /// File path, or executable name for PATH lookups
    pub path: PathBuf,
}

impl Candidate {
    /// Look up `name` in the PATH directories.
    #[must_use]
    pub fn on_path(name: impl Into<PathBuf>) -> Self {
        Self {
            kind: CandidateKind::OnPath,
            path: name.into(),
        }
    }

    /// Binary shipped with the integration.
    #[must_use]
    pub fn bundled(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: CandidateKind::Bundled,
            path: path.into(),
        }
    }

    /// Cache file for the pinned version.
    #[must_use]
    pub fn cached(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: CandidateKind::Cached,
            path: path.into(),
        }
    }
}

/// A candidate that passed the usability checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Tier that matched
    pub kind: CandidateKind,
    /// Resolved executable path
    pub path: PathBuf,
}

/// Probes candidates against a PATH value.
///
/// The PATH value is captured once so that a lookup is a pure function of the
/// locator and the filesystem.
#[derive(Debug, Clone)]
pub struct Locator {
    search_path: Option<OsString>,
    cwd: PathBuf,
}

impl Default for Locator {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Locator {
    /// Locator using the process `PATH` and working directory.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Locator using an explicit PATH value.
    #[must_use]
    pub fn with_search_path(search_path: Option<OsString>) -> Self {
        Self {
            search_path,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Return the first candidate that exists, is a regular file and is
    /// executable. Absence is a normal outcome, not an error.
    #[must_use]
    pub fn locate(&self, candidates: &[Candidate]) -> Option<Located> {
        candidates.iter().find_map(|candidate| {
            let found = match candidate.kind {
                CandidateKind::OnPath => self.search_on_path(&candidate.path),
                CandidateKind::Bundled | CandidateKind::Cached => {
                    is_executable_file(&candidate.path).then(|| candidate.path.clone())
                }
            };
            match &found {
                Some(path) => debug!(tier = %candidate.kind, ?path, "Found executable"),
                None => trace!(tier = %candidate.kind, path = ?candidate.path, "No executable"),
            }
            found.map(|path| Located {
                kind: candidate.kind,
                path,
            })
        })
    }

    fn search_on_path(&self, name: &Path) -> Option<PathBuf> {
        let search_path = self.search_path.as_ref()?;
        which::which_in(name, Some(search_path), &self.cwd)
            .ok()
            .filter(|path| is_executable_file(path))
    }
}

/// Whether `path` is a regular file the current user may execute.
#[must_use]
pub fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(path: &Path, executable: bool) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = if executable { 0o755 } else { 0o644 };
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = executable;
    }

    #[test]
    fn test_missing_candidates_yield_none() {
        let temp = TempDir::new().unwrap();
        let locator = Locator::with_search_path(None);
        let candidates = [
            Candidate::on_path("iccheck"),
            Candidate::bundled(temp.path().join("bin/iccheck")),
            Candidate::cached(temp.path().join("iccheck-1.0.0")),
        ];
        assert_eq!(locator.locate(&candidates), None);
    }

    #[test]
    fn test_directory_is_not_a_match() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("iccheck");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(!is_executable_file(&dir));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let bundled = temp.path().join("bin/iccheck");
        let cached = temp.path().join("iccheck-1.0.0");
        write_file(&bundled, false);
        write_file(&cached, true);

        let locator = Locator::with_search_path(None);
        let found = locator
            .locate(&[Candidate::bundled(&bundled), Candidate::cached(&cached)])
            .unwrap();
        assert_eq!(found.kind, CandidateKind::Cached);
        assert_eq!(found.path, cached);
    }

    #[test]
    fn test_first_match_wins() {
        let temp = TempDir::new().unwrap();
        let bundled = temp.path().join("bin/iccheck");
        let cached = temp.path().join("iccheck-1.0.0");
        write_file(&bundled, true);
        write_file(&cached, true);

        let locator = Locator::with_search_path(None);
        let found = locator
            .locate(&[Candidate::bundled(&bundled), Candidate::cached(&cached)])
            .unwrap();
        assert_eq!(found.kind, CandidateKind::Bundled);
    }

    #[cfg(unix)]
    #[test]
    fn test_path_directories_searched_in_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        write_file(&first.join("iccheck"), true);
        write_file(&second.join("iccheck"), true);

        let search_path = std::env::join_paths([&second, &first]).unwrap();
        let locator = Locator::with_search_path(Some(search_path));
        let found = locator.locate(&[Candidate::on_path("iccheck")]).unwrap();
        assert_eq!(found.kind, CandidateKind::OnPath);
        assert_eq!(found.path, second.join("iccheck"));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_requires_exact_name() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join("iccheck-dev"), true);

        let search_path = std::env::join_paths([temp.path()]).unwrap();
        let locator = Locator::with_search_path(Some(search_path));
        assert_eq!(locator.locate(&[Candidate::on_path("iccheck")]), None);
    }
}
