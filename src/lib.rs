//! # LXC Subnet Router
//!
//! Turns a Proxmox VE LXC container into a Tailscale subnet router: installs
//! Tailscale in the container, enables IP forwarding, grants the container
//! `/dev/net/tun`, tunes UDP offload on the host bridge, restarts the
//! container and installs a boot-time service that re-advertises the routes.
//!
//! ## Architecture Overview
//!
//! - **[`cli`]**: argument parsing and TOML settings discovery
//! - **[`router`]**: validation of the container id and the subnet to advertise
//! - **[`provision`]**: the ordered provisioning sequence
//! - **[`executor`]**: external command execution behind a trait
//! - **[`env`]**: paths and constants on the host and inside the container
//!
//! Input is validated in full before any external command runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lxc_subnet_router::cli::{Invocation, RouterSettings, parse_args};
//! use lxc_subnet_router::executor::HostExecutor;
//! use lxc_subnet_router::provision::Provisioner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let Invocation::Run(raw) = parse_args(["-c", "102", "-s", "192.168.1.0/24"])? else {
//!         return Ok(());
//!     };
//!     let config = raw.into_config()?;
//!
//!     let provisioner = Provisioner::new(HostExecutor::new(), RouterSettings::default());
//!     let report = provisioner.run(&config).await?;
//!     println!("Advertising {}", report.advertised);
//!     Ok(())
//! }
//! ```

/// Command line parsing and configuration discovery.
pub mod cli;

/// Environment constants and path utilities.
///
/// Centralizes the Proxmox host paths and in-container artifact paths.
pub mod env;

/// External command execution.
pub mod executor;

/// Provisioning sequence for the container and the host.
pub mod provision;

/// Validated run configuration.
pub mod router;

pub use cli::{ArgsError, Invocation, RouterSettings, parse_args};
pub use executor::{CommandExecutor, ExecutionCommand, ExecutionResult, HostExecutor};
pub use provision::{ProvisionError, ProvisionReport, Provisioner};
pub use router::{Cidr, ContainerId, RouterConfig, ValidationError};
