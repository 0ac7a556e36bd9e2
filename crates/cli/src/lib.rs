//! ICCheck language server launcher.
//!
//! Editors register the `iccheck-launcher` binary as their language server
//! command. It provisions the pinned ICCheck release through
//! [`iccheck_provision`] and then runs it with inherited stdio.

pub mod cli;
pub mod commands;
pub mod tracing;

use cli::{Cli, CliError, Commands, EXIT_OK, exit_code_for, render_error};

/// Execute a parsed command line and return the process exit code.
pub async fn run(cli: Cli) -> i32 {
    match dispatch(&cli).await {
        Ok(code) => code,
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    }
}

async fn dispatch(cli: &Cli) -> Result<i32, CliError> {
    let config = cli.provision_config()?;
    match &cli.command {
        Commands::Resolve { workspace } => {
            commands::resolve(config, workspace.as_deref(), cli.json).await?;
            Ok(EXIT_OK)
        }
        Commands::Launch {
            workspace,
            extra_args,
        } => commands::launch(config, workspace.as_deref(), extra_args).await,
        Commands::Url { os, arch } => {
            commands::url(&config, os.as_deref(), arch.as_deref(), cli.json)?;
            Ok(EXIT_OK)
        }
        Commands::Platform => {
            commands::platform(cli.json)?;
            Ok(EXIT_OK)
        }
    }
}
