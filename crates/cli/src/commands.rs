//! Subcommand implementations.

use iccheck_provision::{PlatformTag, ProvisionConfig, ProvisionResult, Provisioner, resolve_url};
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use tracing::{debug, info, instrument};

use crate::cli::{CliError, EXIT_PROVISION, EXIT_SIGINT, OkEnvelope};

fn print_json<T: Serialize>(data: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&OkEnvelope::new(data))
        .map_err(|e| CliError::other_with_help(e.to_string(), "Report this as a bug"))?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_result(result: &ProvisionResult) {
    println!("{}", result.executable_path.display());
    println!("args: {}", result.launch_args.join(" "));
    println!("cwd: {}", result.working_directory.display());
    println!("origin: {}", result.origin);
}

/// Provision the companion binary and print its launch command.
///
/// # Errors
///
/// Returns the provisioning failure mapped to a `CliError`.
pub async fn resolve(
    config: ProvisionConfig,
    workspace: Option<&Path>,
    json: bool,
) -> Result<(), CliError> {
    let provisioner = Provisioner::new(config)?;
    let result = provisioner.provision(workspace).await?;
    if json {
        print_json(&result)
    } else {
        print_result(&result);
        Ok(())
    }
}

/// Provision the companion binary, run it, and return its exit code.
///
/// Stdio is inherited, so the editor talks to the language server directly.
/// The child is killed if the launcher is interrupted.
///
/// # Errors
///
/// Returns a `CliError` if provisioning fails or the process cannot be
/// spawned.
#[instrument(skip(config, extra_args))]
pub async fn launch(
    config: ProvisionConfig,
    workspace: Option<&Path>,
    extra_args: &[String],
) -> Result<i32, CliError> {
    let provisioner = Provisioner::new(config)?;
    let result = provisioner.provision(workspace).await?;

    info!(
        executable = %result.executable_path.display(),
        args = ?result.launch_args,
        cwd = %result.working_directory.display(),
        "Starting ICCheck language server"
    );

    let mut child = tokio::process::Command::new(&result.executable_path)
        .args(&result.launch_args)
        .args(extra_args)
        .current_dir(&result.working_directory)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            CliError::provision_with_help(
                format!(
                    "Failed to start {}: {e}",
                    result.executable_path.display()
                ),
                "Check that the binary matches this platform",
            )
        })?;

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| {
                CliError::other_with_help(
                    format!("Failed to wait for language server: {e}"),
                    "The process may have been killed externally",
                )
            })?;
            debug!(%status, "Language server exited");
            Ok(status.code().unwrap_or(EXIT_PROVISION))
        }
        _ = tokio::signal::ctrl_c() => {
            debug!("Interrupted, stopping language server");
            let _ = child.kill().await;
            Ok(EXIT_SIGINT)
        }
    }
}

#[derive(Serialize)]
struct UrlOutput<'a> {
    version: &'a str,
    platform: String,
    url: String,
}

/// Print the release URL for the pinned version.
///
/// # Errors
///
/// Returns a provisioning error if the platform has no release artifact.
pub fn url(
    config: &ProvisionConfig,
    os: Option<&str>,
    arch: Option<&str>,
    json: bool,
) -> Result<(), CliError> {
    let platform = match (os, arch) {
        (Some(os), Some(arch)) => PlatformTag::from_names(os, arch),
        _ => PlatformTag::detect(),
    };
    let url = resolve_url(
        &config.release_base,
        &config.artifact_name,
        &config.version,
        &platform,
    )?;

    if json {
        print_json(&UrlOutput {
            version: &config.version,
            platform: platform.to_string(),
            url,
        })
    } else {
        #[allow(clippy::print_stdout)]
        {
            println!("{url}");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct PlatformOutput<'a> {
    os: String,
    arch: String,
    host_os: &'a str,
    host_arch: &'a str,
    supported: bool,
}

/// Print the detected platform.
///
/// # Errors
///
/// Only fails if JSON serialization fails.
pub fn platform(json: bool) -> Result<(), CliError> {
    let tag = PlatformTag::detect();
    if json {
        print_json(&PlatformOutput {
            os: tag.os.to_string(),
            arch: tag.arch.to_string(),
            host_os: tag.raw_os(),
            host_arch: tag.raw_arch(),
            supported: tag.is_supported(),
        })
    } else {
        #[allow(clippy::print_stdout)]
        {
            println!("{tag}");
        }
        Ok(())
    }
}
