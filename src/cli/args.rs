//! Command line argument parsing
//!
//! The surface is a flat list of options, no subcommands:
//! - `--container`/`-c <ID>`: Proxmox container id (default 100)
//! - `--subnet`/`-s <CIDR|IP>`, alias `--ipaddr`/`-i`: route to advertise
//! - `--help`/`-h`: print usage and exit
//!
//! Repeated options keep the last value. Help wins over everything else in
//! the token stream, including unknown options. A bare `--` is not an option
//! terminator here; it is rejected like any other unknown token.

use crate::env::DEFAULT_CONTAINER_ID;
use crate::router::{RouterConfig, ValidationError};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use std::ffi::OsString;

/// Binary name shown in usage text
pub const BIN_NAME: &str = "lxc-subnet-router";

/// Options that consume the following token as their value
const VALUE_OPTIONS: &[&str] = &["-c", "--container", "-s", "--subnet", "-i", "--ipaddr"];

const EXAMPLES: &str = "\
Examples:
  lxc-subnet-router -c 102 -s 192.168.1.0/24
  lxc-subnet-router --container 102 --ipaddr 192.168.129.59
  lxc-subnet-router -c 102            (auto-detect the container's address)";

#[derive(Debug, Parser)]
#[command(name = BIN_NAME)]
#[command(about = "Configure a Proxmox LXC container as a Tailscale subnet router")]
#[command(long_about = None)]
#[command(after_help = EXAMPLES)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Proxmox container ID
    #[arg(
        short = 'c',
        long = "container",
        value_name = "ID",
        default_value = DEFAULT_CONTAINER_ID,
        allow_hyphen_values = true
    )]
    pub container: String,

    /// Subnet (CIDR) or single IP to advertise; detected from the container when omitted
    #[arg(
        short = 's',
        long = "subnet",
        visible_alias = "ipaddr",
        visible_short_alias = 'i',
        value_name = "CIDR|IP",
        allow_hyphen_values = true
    )]
    pub subnet: Option<String>,
}

/// Raw option values, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArgs {
    pub container: String,
    pub subnet: Option<String>,
}

impl RawArgs {
    /// Validate into the immutable run configuration
    pub fn into_config(self) -> Result<RouterConfig, ValidationError> {
        RouterConfig::validate(&self.container, self.subnet.as_deref())
    }
}

impl From<Cli> for RawArgs {
    fn from(cli: Cli) -> Self {
        Self {
            container: cli.container,
            subnet: cli.subnet,
        }
    }
}

/// What the caller asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print the usage text and exit successfully
    Help(String),
    /// Provision a container
    Run(RawArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Missing value for {0}")]
    MissingOptionValue(String),

    #[error("Argument is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Parse command line tokens, not including the program name.
pub fn parse_args<I, T>(tokens: I) -> Result<Invocation, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let tokens: Vec<OsString> = tokens.into_iter().map(Into::into).collect();

    if tokens.iter().any(|t| t == "-h" || t == "--help") {
        return Ok(Invocation::Help(usage()));
    }

    let tokens = check_tokens(tokens)?;

    let argv = std::iter::once(BIN_NAME.to_string()).chain(tokens);
    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(Invocation::Run(cli.into())),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Ok(Invocation::Help(usage()))
            }
            ErrorKind::UnknownArgument => Err(ArgsError::UnknownOption(invalid_arg(&err))),
            ErrorKind::InvalidValue
            | ErrorKind::TooFewValues
            | ErrorKind::WrongNumberOfValues => {
                Err(ArgsError::MissingOptionValue(invalid_arg(&err)))
            }
            // nothing else is reachable for this command; reject the token
            _ => Err(ArgsError::UnknownOption(invalid_arg(&err))),
        },
    }
}

/// Reject what clap would otherwise accept: non-UTF-8 tokens and a bare `--`
/// outside a value position.
fn check_tokens(tokens: Vec<OsString>) -> Result<Vec<String>, ArgsError> {
    let mut checked = Vec::with_capacity(tokens.len());
    let mut expecting_value = false;

    for token in tokens {
        let token = token
            .into_string()
            .map_err(|raw| ArgsError::InvalidUtf8(raw.to_string_lossy().into_owned()))?;

        if expecting_value {
            expecting_value = false;
        } else if token == "--" {
            return Err(ArgsError::UnknownOption(token));
        } else {
            expecting_value = VALUE_OPTIONS.contains(&token.as_str());
        }
        checked.push(token);
    }

    Ok(checked)
}

/// Rendered usage text
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

fn invalid_arg(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.clone(),
        _ => err.to_string(),
    }
}
