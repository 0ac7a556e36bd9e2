//! Provisioning of the ICCheck language server binary.
//!
//! Editor integrations need a runnable `iccheck` executable before they can
//! start a language server session. This crate finds one, or downloads the
//! release artifact for the pinned version, and hands back a launch command.
//!
//! # Architecture
//!
//! - [`PlatformTag`] - host OS/architecture mapped onto release naming
//! - [`Locator`] - first-match probe over PATH, bundled and cache tiers
//! - [`resolve_url`] - release artifact URL for a version and platform
//! - [`ArtifactFetcher`] / [`HttpFetcher`] - atomic streaming download
//! - [`mark_executable`] - owner execute permission
//! - [`Provisioner`] - resolve-or-acquire orchestration
//!
//! # Example
//!
//! ```ignore
//! use iccheck_provision::{ProvisionConfig, Provisioner};
//!
//! let provisioner = Provisioner::new(ProvisionConfig::default())?;
//! let command = provisioner.provision(Some(workspace_root)).await?;
//! spawn(&command.executable_path, &command.launch_args, &command.working_directory);
//! ```

pub mod config;
mod error;
pub mod fetcher;
pub mod locator;
pub mod orchestrator;
pub mod permissions;
pub mod platform;
pub mod resolver;

pub use config::{AcquisitionMode, PINNED_VERSION, ProvisionConfig};
pub use error::{BoxedCause, Error, Result};
pub use fetcher::{ArtifactFetcher, HttpFetcher};
pub use locator::{Candidate, CandidateKind, Located, Locator};
pub use orchestrator::{Origin, ProvisionResult, ProvisionState, Provisioner};
pub use permissions::mark_executable;
pub use platform::{Arch, Os, PlatformTag};
pub use resolver::resolve_url;
