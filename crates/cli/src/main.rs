//! iccheck-launcher binary entry point

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use iccheck_launcher::cli;
use iccheck_launcher::tracing::{TracingConfig, init_tracing};

fn main() {
    // NOTE: tracing may be unusable during a panic, so write directly.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    if let Err(e) = init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
    }) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            std::process::exit(cli::EXIT_PROVISION);
        }
    };

    let exit_code = rt.block_on(iccheck_launcher::run(cli));
    std::process::exit(exit_code);
}
