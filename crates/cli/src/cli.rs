use clap::{Parser, Subcommand};
use iccheck_provision::{AcquisitionMode, ProvisionConfig};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::tracing::{LogLevel, TracingFormat};

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Provisioning (platform, download, lookup) error exit code
pub const EXIT_PROVISION: i32 = 3;
/// Exit code for SIGINT (128 + signal number 2)
pub const EXIT_SIGINT: i32 = 130;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(iccheck::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The companion binary could not be provided (exit code 3)
    #[error("Provisioning error: {message}")]
    #[diagnostic(code(iccheck::cli::provision))]
    Provision {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(iccheck::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new provisioning error with help text
    #[must_use]
    pub fn provision_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Provision {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error with help text
    #[must_use]
    pub fn other_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert `iccheck_provision::Error` to the matching `CliError` variant.
///
/// - Configuration errors -> Config (exit code 2)
/// - Platform, lookup and fetch-class errors -> Provision (exit code 3)
impl From<iccheck_provision::Error> for CliError {
    fn from(err: iccheck_provision::Error) -> Self {
        use iccheck_provision::Error;

        match err {
            Error::Configuration { message, help } => Self::Config { message, help },
            Error::UnsupportedPlatform { .. } => Self::provision_with_help(
                err.to_string(),
                "ICCheck has no release for this platform; build it from source and put it on PATH",
            ),
            Error::NotFound { ref searched, .. } => {
                let searched = searched
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Self::provision_with_help(err.to_string(), format!("Searched: {searched}"))
            }
            Error::Fetch { .. } | Error::Permission { .. } | Error::Io { .. } => {
                Self::provision_with_help(
                    error_chain(&err),
                    "Nothing was cached; restart the language server to retry",
                )
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Provision { .. } | CliError::Other { .. } => EXIT_PROVISION,
    }
}

/// Render error appropriately based on JSON flag
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": match err {
                CliError::Config { .. } => "config",
                CliError::Provision { .. } => "provision",
                CliError::Other { .. } => "other",
            },
            "message": err.to_string()
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Provisions and launches the ICCheck language server.
///
/// Register `iccheck-launcher launch` as the language server command in an
/// editor; it finds or downloads the pinned ICCheck release and runs it.
#[derive(Parser, Debug)]
#[command(name = "iccheck-launcher")]
#[command(about = "Provision and launch the ICCheck language server")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    /// Emit JSON envelopes on stdout.
    #[arg(long, global = true, help = "Emit JSON envelope regardless of format")]
    pub json: bool,

    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "ICCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for downloaded binaries.
    #[arg(long, global = true, env = "ICCHECK_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Never download; use PATH or the bundled binary only.
    #[arg(long, global = true, env = "ICCHECK_BUNDLED_ONLY")]
    pub bundled_only: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Locate or download the binary and print the launch command.
    Resolve {
        /// Project root used as the server's working directory
        #[arg(long, short = 'w')]
        workspace: Option<PathBuf>,
    },
    /// Locate or download the binary, then run it with inherited stdio.
    Launch {
        /// Project root used as the server's working directory
        #[arg(long, short = 'w')]
        workspace: Option<PathBuf>,
        /// Extra arguments appended after the configured launch arguments
        #[arg(last = true)]
        extra_args: Vec<String>,
    },
    /// Print the release download URL for the pinned version.
    Url {
        /// OS name to resolve for instead of the host
        #[arg(long, requires = "arch")]
        os: Option<String>,
        /// Architecture name to resolve for instead of the host
        #[arg(long, requires = "os")]
        arch: Option<String>,
    },
    /// Print the detected platform tag.
    Platform,
}

impl Cli {
    /// Build the provisioning configuration from file and flags.
    ///
    /// # Errors
    ///
    /// Returns a config error if the configuration file cannot be loaded.
    pub fn provision_config(&self) -> Result<ProvisionConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => ProvisionConfig::load(path).map_err(|e| match e {
                iccheck_provision::Error::Io { source, .. } => CliError::Config {
                    message: format!("Cannot read {}: {source}", path.display()),
                    help: Some("Check the --config path or ICCHECK_CONFIG".to_string()),
                },
                other => CliError::from(other),
            })?,
            None => ProvisionConfig::default(),
        };

        if let Some(cache_dir) = &self.cache_dir {
            config = config.with_cache_dir(cache_dir.clone());
        }
        if self.bundled_only {
            config = config.with_acquisition(AcquisitionMode::BundledOnly);
        }
        Ok(config)
    }
}

/// Parse command line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
