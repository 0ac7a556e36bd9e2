//! Tracing setup for the launcher.
//!
//! Everything goes to stderr. Stdout belongs to the language server once the
//! child process is running.

use std::io;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Tracing output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format
    Json,
}

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Level for this workspace's crates
    pub level: Level,
}

/// Session ID distinguishing launchers started by different editor windows
static SESSION_ID: std::sync::OnceLock<Uuid> = std::sync::OnceLock::new();

/// Get or create the session ID for this process
pub fn session_id() -> Uuid {
    *SESSION_ID.get_or_init(Uuid::new_v4)
}

fn default_directives(level: Level) -> String {
    let level_str = match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    };
    format!("iccheck_launcher={level_str},iccheck_provision={level_str}")
}

/// Initialize tracing with the given configuration
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns an error if the filter directives cannot be parsed.
pub fn init_tracing(config: TracingConfig) -> miette::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(config.level)))
        .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        TracingFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true);

            registry.with(layer).init();
        }
        TracingFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false)
                .with_ansi(false);

            registry.with(layer).init();
        }
        TracingFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true);

            registry.with(layer).init();
        }
    }

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_a_value_enum() {
        use clap::ValueEnum;
        assert_eq!(
            TracingFormat::from_str("json", true).unwrap(),
            TracingFormat::Json
        );
        assert!(TracingFormat::from_str("dev", true).is_err());
    }

    #[test]
    fn test_default_directives_cover_both_crates() {
        let directives = default_directives(Level::DEBUG);
        assert_eq!(
            directives,
            "iccheck_launcher=debug,iccheck_provision=debug"
        );
    }

    #[test]
    fn test_session_id_consistency() {
        assert_eq!(session_id(), session_id());
    }
}
