//! Error types for the iccheck-provision crate

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed underlying cause carried by fetch and permission failures.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for provisioning operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The host OS or architecture has no matching release artifact
    #[error("Unsupported platform: os '{os}', arch '{arch}'")]
    #[diagnostic(
        code(iccheck::platform::unsupported),
        help("ICCheck publishes binaries for windows, linux and darwin on amd64 and arm64 only")
    )]
    UnsupportedPlatform {
        /// Host OS name as reported by the environment
        os: String,
        /// Host CPU architecture as reported by the environment
        arch: String,
    },

    /// Network, HTTP status or filesystem failure while downloading
    #[error("Failed to fetch {url}: {message}")]
    #[diagnostic(
        code(iccheck::fetch::failed),
        help("Check your network connection, then restart the language server to retry")
    )]
    Fetch {
        /// The artifact URL being downloaded
        url: String,
        /// Short description of what went wrong
        message: String,
        /// The underlying cause, if any
        #[source]
        source: Option<BoxedCause>,
    },

    /// A fetched file could not be marked or confirmed executable
    #[error("Cannot make {} executable: {message}", path.display())]
    #[diagnostic(code(iccheck::permission::denied))]
    Permission {
        /// The file whose permissions could not be set or confirmed
        path: Box<Path>,
        /// Short description of what went wrong
        message: String,
        /// The underlying I/O error, if any
        #[source]
        source: Option<std::io::Error>,
    },

    /// No tier produced an executable and acquisition is disabled
    #[error("Executable '{name}' not found")]
    #[diagnostic(
        code(iccheck::locate::not_found),
        help("Install the executable on PATH or reinstall the editor integration")
    )]
    NotFound {
        /// The executable name that was searched for
        name: String,
        /// Locations that were probed, in priority order
        searched: Vec<PathBuf>,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(iccheck::config::invalid))]
    Configuration {
        /// The error message describing the configuration issue
        message: String,
        /// Optional hint for fixing the configuration
        #[help]
        help: Option<String>,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(iccheck::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path where the I/O error occurred, if applicable
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },
}

impl Error {
    /// Create an unsupported platform error
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Create a fetch error without an underlying cause
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a fetch error wrapping an underlying cause
    pub fn fetch_with_source(
        url: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a permission error
    pub fn permission(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Permission {
            path: path.into().into_boxed_path(),
            message: message.into(),
            source,
        }
    }

    /// Create a not-found error listing the probed locations
    pub fn not_found(name: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        Self::NotFound {
            name: name.into(),
            searched,
        }
    }

    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with a help hint
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(|p| p.into_boxed_path()),
            operation: operation.into(),
        }
    }

    /// Whether this failure belongs to the fetch class.
    ///
    /// Fetch-class failures are recoverable by re-running provisioning, since
    /// no partial artifact is ever left at the cache path.
    #[must_use]
    pub fn is_fetch_class(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Permission { .. } | Self::Io { .. }
        )
    }
}

/// Result type for provisioning operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_platform_message() {
        let err = Error::unsupported_platform("plan9", "mips");
        assert_eq!(
            err.to_string(),
            "Unsupported platform: os 'plan9', arch 'mips'"
        );
        assert!(!err.is_fetch_class());
    }

    #[test]
    fn test_fetch_error_carries_url_and_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::fetch_with_source("https://example.com/a", "stream interrupted", cause);
        assert!(err.to_string().contains("https://example.com/a"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_fetch_class());
    }

    #[test]
    fn test_permission_is_fetch_class() {
        let err = Error::permission("/tmp/iccheck", "not executable", None);
        assert!(err.is_fetch_class());
        assert!(err.to_string().contains("/tmp/iccheck"));
    }

    #[test]
    fn test_not_found_is_terminal() {
        let err = Error::not_found("iccheck", vec![PathBuf::from("/opt/iccheck")]);
        assert_eq!(err.to_string(), "Executable 'iccheck' not found");
        assert!(!err.is_fetch_class());
    }

    #[test]
    fn test_io_error_names_operation() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io(source, Some(PathBuf::from("/etc/iccheck.toml")), "read config");
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.to_string(), "I/O error during read config: gone");
        assert!(err.is_fetch_class());
    }
}
